#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use itertools::Itertools;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use crate::decode::{parse_response, Solution, Verdict};
    use crate::encode::ConstraintSystem;
    use crate::error::{DecodeError, OracleError, ValidationError};
    use crate::index::VarIndex;
    use crate::optimize::{Outcome, Router};
    use crate::oracle::{Oracle, PbSolverCommand};
    use crate::{Dimension, Location, Pair, Problem};

    /// Exhaustive oracle for tiny instances, answering in the solver wire format.
    /// Returns the first satisfying assignment in bit order, like a black box would
    /// return an arbitrary one.
    struct BruteForce;

    impl Oracle for BruteForce {
        fn invoke(&mut self, system: &ConstraintSystem) -> Result<String, OracleError> {
            let variables = system.variables();
            assert!(variables <= 20, "brute force oracle is exponential");

            for bits in 0u32..(1u32 << variables) {
                let assignment = |id: usize| bits >> (id - 1) & 1 == 1;
                if system.satisfied_by(assignment) {
                    let model = (1..=variables)
                        .map(|id| match assignment(id) {
                            true => format!("x{}", id),
                            false => format!("~x{}", id),
                        })
                        .join(" ");
                    return Ok(format!("s SATISFIABLE\nv {}\n", model));
                }
            }

            Ok("s UNSATISFIABLE\n".to_owned())
        }
    }

    fn dims(n: usize, m: usize) -> (Dimension, Dimension) {
        (NonZero::new(n).unwrap(), NonZero::new(m).unwrap())
    }

    fn problem(n: usize, m: usize, pairs: Vec<Pair>) -> Problem {
        Problem::new(dims(n, m), pairs).unwrap()
    }

    fn feasible_at(problem: &Problem, c_max: usize) -> bool {
        let system = ConstraintSystem::encode(problem, c_max);
        let raw = BruteForce.invoke(&system).unwrap();
        match parse_response(&raw, &VarIndex::of(problem)).unwrap() {
            Verdict::Satisfiable(_) => true,
            Verdict::Unsatisfiable => false,
        }
    }

    #[test]
    fn variable_id_round_trip() {
        for (n, m, p) in [(1, 1, 1), (2, 1, 1), (3, 3, 2), (4, 2, 3), (2, 5, 2)] {
            let index = VarIndex::new(n, m, p);
            for id in 1..=index.variables() {
                let (location, pair) = index.decompose(id);
                assert_eq!(index.id(location, pair), id);
            }
        }
    }

    #[test]
    fn variable_id_formula() {
        let index = VarIndex::new(3, 3, 2);
        assert_eq!(index.variables(), 18);
        assert_eq!(index.id(Location(0, 0), 0), 1);
        assert_eq!(index.id(Location(2, 1), 1), 2 + 3 + 9 + 1);
        assert_eq!(index.decompose(18), (Location(2, 2), 1));
    }

    #[test]
    fn validation_rejects_out_of_bounds() {
        let result = Problem::new(dims(3, 3), vec![Pair(Location(0, 0), Location(3, 1))]);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::OutOfBounds { pair: 0, terminal: Location(3, 1), n: 3, m: 3 },
        );
    }

    #[test]
    fn validation_rejects_coincident_terminals() {
        let result = Problem::new(dims(3, 3), vec![Pair(Location(1, 1), Location(1, 1))]);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::CoincidentTerminals { pair: 0, terminal: Location(1, 1) },
        );
    }

    #[test]
    fn validation_rejects_shared_terminal() {
        let result = Problem::new(dims(3, 3), vec![
            Pair(Location(0, 0), Location(2, 2)),
            Pair(Location(2, 0), Location(2, 2)),
        ]);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::SharedTerminal { terminal: Location(2, 2), first: 0, second: 1 },
        );
    }

    #[test]
    fn validation_rejects_empty() {
        assert_eq!(Problem::new(dims(3, 3), vec![]).unwrap_err(), ValidationError::NoPairs);
    }

    #[test]
    fn lower_bound_is_manhattan_plus_one() {
        let single = problem(3, 3, vec![Pair(Location(0, 0), Location(2, 2))]);
        assert_eq!(single.lower_bound(), 5);

        let double = problem(3, 3, vec![
            Pair(Location(0, 1), Location(2, 1)),
            Pair(Location(1, 0), Location(1, 2)),
        ]);
        assert_eq!(double.lower_bound(), 6);
    }

    #[test]
    fn opb_output_uncapped() {
        let problem = problem(2, 1, vec![Pair(Location(0, 0), Location(1, 0))]);
        let system = ConstraintSystem::encode(&problem, problem.cells());

        assert_eq!(format!("{}", system), "* #variable= 2 #constraint= 6
min: +1 x1 +1 x2;
+1 x1 >= 1;
+1 x2 >= 1;
+1 x2 = 1;
+1 x1 = 1;
-1 x1 >= -1;
-1 x2 >= -1;
");
    }

    #[test]
    fn opb_output_capped() {
        let problem = problem(2, 1, vec![Pair(Location(0, 0), Location(1, 0))]);
        let system = ConstraintSystem::encode(&problem, 1);

        let text = format!("{}", system);
        assert!(text.starts_with("* #variable= 2 #constraint= 7\n"));
        assert!(text.ends_with("-1 x1 -1 x2 >= -1;\n"));
    }

    #[test]
    fn opb_pass_through_uses_in_grid_neighbors_only() {
        // cell (1, 0) sits on two edges of a 2x2 grid, so its biconditional sums
        // over two neighbors, not four
        let problem = problem(2, 2, vec![Pair(Location(0, 0), Location(1, 1))]);
        let system = ConstraintSystem::encode(&problem, problem.cells());

        let text = format!("{}", system);
        assert!(text.contains("-1 x1 -1 x4 +3 ~x2 >= -2;\n"));
        assert!(text.contains("+1 x1 +1 x4 +3 ~x2 >= 2;\n"));
        // header count matches the emitted lines
        assert!(text.starts_with("* #variable= 4 #constraint= 12\n"));
        assert_eq!(system.constraints().len(), 12);
    }

    #[test]
    fn pass_through_skip_is_pair_aware() {
        // every cell is some pair's terminal, but each still gets a pass-through
        // under the pair it does not belong to
        let problem = problem(2, 2, vec![
            Pair(Location(0, 0), Location(0, 1)),
            Pair(Location(1, 0), Location(1, 1)),
        ]);

        let system = ConstraintSystem::encode(&problem, problem.cells());
        let text = format!("{}", system);
        // (0, 0) under pair 1 is id 5; it is no terminal of pair 1
        assert!(text.contains("+3 ~x5 >= 2;\n"));
        // 8 terminal constraints, 8 pass-through constraints, 4 disjointness
        assert_eq!(system.constraints().len(), 20);
    }

    #[test]
    fn decode_reports_unsat() {
        let index = VarIndex::new(2, 1, 1);
        let verdict = parse_response("c preamble\ns UNSATISFIABLE\n", &index).unwrap();
        assert_eq!(verdict, Verdict::Unsatisfiable);
    }

    #[test]
    fn decode_collects_positive_literals() {
        let index = VarIndex::new(2, 2, 1);
        let verdict = parse_response("s SATISFIABLE\nv x1 ~x2 x3 ~x4\n", &index).unwrap();
        assert_eq!(verdict, Verdict::Satisfiable(vec![1, 3]));
    }

    #[test]
    fn decode_rejects_malformed_output() {
        let index = VarIndex::new(2, 1, 1);

        assert_eq!(parse_response("hello\n", &index).unwrap_err(), DecodeError::MissingStatus);
        assert_eq!(
            parse_response("s SATISFIABLE\n", &index).unwrap_err(),
            DecodeError::MissingModel,
        );
        assert_eq!(
            parse_response("s SATISFIABLE\nv x1 y2\n", &index).unwrap_err(),
            DecodeError::BadLiteral { token: "y2".to_owned() },
        );
        assert_eq!(
            parse_response("s SATISFIABLE\nv x9\n", &index).unwrap_err(),
            DecodeError::IdOutOfRange { id: 9, max: 2 },
        );
    }

    #[test]
    fn solution_collapses_model_onto_grid() {
        let problem = problem(2, 1, vec![Pair(Location(0, 0), Location(1, 0))]);
        let solution = Solution::from_model(&problem, &[1, 2]);

        assert_eq!(solution.cost(), 2);
        assert_eq!(solution.label_at(Location(0, 0)), 1);
        assert_eq!(solution.label_at(Location(1, 0)), 1);
        assert_eq!(format!("{}", solution), "AA\n");
    }

    #[test]
    fn path_walk_backtracks_out_of_dead_ends() {
        // labeled cells form the pair's path down the right column plus a spur
        // along the bottom row; a greedy walk entering the spur would abort
        let problem = problem(3, 3, vec![Pair(Location(2, 2), Location(2, 0))]);
        let index = VarIndex::of(&problem);
        let labeled = [Location(2, 2), Location(1, 2), Location(0, 2), Location(2, 1), Location(2, 0)];
        let ids = labeled.iter().map(|&cell| index.id(cell, 0)).collect_vec();

        let solution = Solution::from_model(&problem, &ids);
        let path = solution.trace_path(0).unwrap();
        assert_eq!(path, vec![Location(2, 2), Location(2, 1), Location(2, 0)]);
    }

    #[test]
    fn path_walk_fails_on_disconnected_labels() {
        let problem = problem(3, 1, vec![Pair(Location(0, 0), Location(2, 0))]);
        let index = VarIndex::of(&problem);
        // middle cell missing, so the terminals are not connected
        let ids = [index.id(Location(0, 0), 0), index.id(Location(2, 0), 0)];

        let solution = Solution::from_model(&problem, &ids);
        assert_eq!(solution.trace_path(0).unwrap_err(), DecodeError::PathNotFound { pair: 0 });
    }

    #[test]
    fn walked_solution_drops_stray_loops() {
        // a closed loop of active cells, disconnected from the real path, as an
        // uncapped model may legally contain
        let problem = problem(4, 3, vec![Pair(Location(0, 0), Location(0, 2))]);
        let index = VarIndex::of(&problem);
        let path = [Location(0, 0), Location(0, 1), Location(0, 2)];
        let noise = [Location(2, 0), Location(3, 0), Location(3, 1), Location(2, 1)];
        let ids = path.iter().chain(noise.iter()).map(|&cell| index.id(cell, 0)).collect_vec();

        let solution = Solution::from_model(&problem, &ids);
        assert_eq!(solution.cost(), 7);

        let walked = solution.walked().unwrap();
        assert_eq!(walked.cost(), 3);
        assert_eq!(walked.label_at(Location(2, 0)), 0);
        assert_eq!(format!("{}", walked), "A...
a...
A...
");
    }

    #[test]
    fn routes_adjacent_terminals() {
        // expected optimal cost 2, both cells used
        let problem = problem(2, 1, vec![Pair(Location(0, 0), Location(1, 0))]);
        assert_eq!(problem.lower_bound(), 2);

        let Outcome::Routed { solution, cost } = Router::new(&problem, BruteForce).optimize().unwrap() else {
            panic!("expected a routing");
        };
        assert_eq!(cost, 2);
        assert_eq!(format!("{}", solution), "AA\n");
    }

    #[test]
    fn routes_corner_to_corner_at_lower_bound() {
        // a monotone staircase of length 5 exists, so the encoding must not force
        // a longer route
        let problem = problem(3, 3, vec![Pair(Location(0, 0), Location(2, 2))]);
        assert_eq!(problem.lower_bound(), 5);

        let Outcome::Routed { solution, cost } = Router::new(&problem, BruteForce).optimize().unwrap() else {
            panic!("expected a routing");
        };
        assert_eq!(cost, 5);

        let path = solution.trace_path(0).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(*path.first().unwrap(), Location(0, 0));
        assert_eq!(*path.last().unwrap(), Location(2, 2));
        for (a, b) in path.iter().tuple_windows() {
            assert_eq!(a.manhattan_to(*b), 1);
        }
    }

    #[test]
    fn crossing_pairs_without_detour_room_are_infeasible() {
        // both straight paths need the center cell and every detour is walled off
        // by the other pair's terminals
        let problem = problem(3, 3, vec![
            Pair(Location(0, 1), Location(2, 1)),
            Pair(Location(1, 0), Location(1, 2)),
        ]);

        let outcome = Router::new(&problem, BruteForce).optimize().unwrap();
        assert!(matches!(outcome, Outcome::Infeasible));
    }

    #[test]
    fn blocked_pair_detours_above_lower_bound() {
        // pair 1 blocks pair 0's straight route, forcing it around the far side
        let problem = problem(3, 3, vec![
            Pair(Location(0, 0), Location(2, 0)),
            Pair(Location(1, 0), Location(1, 1)),
        ]);
        assert_eq!(problem.lower_bound(), 5);

        let Outcome::Routed { solution, cost } = Router::new(&problem, BruteForce).optimize().unwrap() else {
            panic!("expected a routing");
        };
        assert_eq!(cost, 9);
        assert_eq!(solution.trace_path(0).unwrap().len(), 7);
        assert_eq!(solution.trace_path(1).unwrap().len(), 2);
    }

    #[test]
    fn decoded_paths_have_terminal_degree_one() {
        let problem = problem(3, 3, vec![
            Pair(Location(0, 0), Location(2, 0)),
            Pair(Location(1, 0), Location(1, 1)),
        ]);
        let Outcome::Routed { solution, .. } = Router::new(&problem, BruteForce).optimize().unwrap() else {
            panic!("expected a routing");
        };

        for pair in 0..problem.pairs().len() {
            let path = solution.trace_path(pair).unwrap();
            assert!(path.iter().all_unique());

            for (position, cell) in path.iter().enumerate() {
                let in_path_neighbors = path.iter()
                    .filter(|other| cell.manhattan_to(**other) == 1)
                    .count();
                let expected = match position == 0 || position == path.len() - 1 {
                    true => 1,
                    false => 2,
                };
                assert_eq!(in_path_neighbors, expected, "degree of {} in pair {}", cell, pair);
            }
        }
    }

    #[test]
    fn feasibility_is_monotone_in_the_cap() {
        let mut rng = StdRng::seed_from_u64(0x9e3779b9);

        for _ in 0..8 {
            let (n, m) = *[(2, 2), (3, 2), (2, 3), (3, 3)].choose(&mut rng).unwrap();
            // two pairs only where the brute force oracle stays within reach
            let pairs = match n * m * 2 <= 12 && rng.gen_bool(0.5) {
                true => 2,
                false => 1,
            };

            let mut cells = (0..n * m).map(|i| Location(i % n, i / n)).collect_vec();
            cells.shuffle(&mut rng);
            let terminals = cells.into_iter().take(pairs * 2).collect_vec();
            let problem = problem(
                n,
                m,
                terminals.chunks(2).map(|pair| Pair(pair[0], pair[1])).collect_vec(),
            );

            let mut seen_feasible = false;
            for c_max in 1..=problem.cells() {
                let feasible = feasible_at(&problem, c_max);
                assert!(
                    !seen_feasible || feasible,
                    "feasible at a lower cap but not at {} on {}x{}", c_max, n, m,
                );
                seen_feasible |= feasible;
            }
        }
    }

    #[test]
    fn optimal_cost_never_beats_the_lower_bound() {
        let mut rng = StdRng::seed_from_u64(0xdecafbad);

        for _ in 0..6 {
            let (n, m) = *[(3, 2), (2, 3), (3, 3)].choose(&mut rng).unwrap();
            let mut cells = (0..n * m).map(|i| Location(i % n, i / n)).collect_vec();
            cells.shuffle(&mut rng);
            let problem = problem(n, m, vec![Pair(cells[0], cells[1])]);

            if let Outcome::Routed { cost, .. } = Router::new(&problem, BruteForce).optimize().unwrap() {
                assert!(cost >= problem.lower_bound());
            }
        }
    }

    #[test]
    fn missing_solver_is_a_launch_error() {
        let problem = problem(2, 1, vec![Pair(Location(0, 0), Location(1, 0))]);
        let system = ConstraintSystem::encode(&problem, problem.cells());
        let instance = std::env::temp_dir().join("gridroute_launch_test.opb");

        let mut oracle = PbSolverCommand::new("/nonexistent/pbsolver", &instance);
        assert_eq!(oracle.instance_path(), instance.as_path());
        let error = oracle.invoke(&system).unwrap_err();
        assert!(matches!(error, OracleError::Launch { .. }), "got {:?}", error);

        // the instance file was still written, and in wire format
        let written = std::fs::read_to_string(oracle.instance_path()).unwrap();
        assert!(written.starts_with("* #variable= 2 #constraint= "));
        std::fs::remove_file(&instance).ok();
    }

    #[test]
    fn unwritable_instance_path_is_a_write_error() {
        let problem = problem(2, 1, vec![Pair(Location(0, 0), Location(1, 0))]);
        let system = ConstraintSystem::encode(&problem, problem.cells());

        let mut oracle = PbSolverCommand::new("pbsolver", "/nonexistent/dir/out.opb");
        let error = oracle.invoke(&system).unwrap_err();
        assert!(matches!(error, OracleError::InstanceWrite { .. }), "got {:?}", error);
    }
}
