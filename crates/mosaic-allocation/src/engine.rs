//! The cell allocation engine.
//!
//! A single pass over the roster, in input order:
//!
//! 1. **Whole-unit extraction** — each patron immediately receives one
//!    wholly owned cell per whole cell unit they pledged. These cells are
//!    never subject to grouping.
//! 2. **Fractional pooling** — leftover fractions accumulate in a credit
//!    pool. Whenever the pool reaches one unit, a greedy
//!    largest-fraction-first group is filled (ties broken by ascending
//!    patron id) until the group reaches one unit; the group becomes one
//!    jointly owned cell. The amount by which the group overshoots one
//!    unit stays with the patron whose addition caused the overshoot, as
//!    their residual pending fraction.
//! 3. **Finalize** — whatever credit and pending patrons survive the pass
//!    are reported for the caller to carry into the next run.
//!
//! The engine is a pure function of its input: no state between
//! invocations, no I/O, no failure modes on a well-formed roster. Grouping
//! decisions depend on the running pool state, so the pass is inherently
//! sequential.

use crate::cell::{Adopter, Cell, CellId};
use crate::result::{AllocationResult, Share};
use mosaic_patron::PatronRoster;

/// Tolerance for comparisons against whole cell boundaries. Derived sums
/// are never compared with exact equality.
pub const EPSILON: f64 = 1e-6;

/// Allocate a roster of pledges onto the wall.
pub fn allocate(roster: &PatronRoster) -> AllocationResult {
    let mut cells: Vec<Cell> = Vec::new();
    let mut next_cell = CellId::FIRST;
    let mut credit_pool = 0.0_f64;
    let mut pending: Vec<Share> = Vec::new();

    for patron in roster {
        let units = patron.cell_units();

        let whole = (units + EPSILON).floor() as u64;
        for _ in 0..whole {
            cells.push(Cell::solo(next_cell, patron.id()));
            next_cell = next_cell.next();
        }

        let fraction = units - whole as f64;
        if fraction < EPSILON {
            continue;
        }
        credit_pool += fraction;
        pending.push(Share {
            patron: patron.id(),
            fraction,
        });

        while credit_pool >= 1.0 - EPSILON && !pending.is_empty() {
            cells.push(fill_cell(next_cell, &mut pending));
            next_cell = next_cell.next();
            // Exactly one unit is consumed per cell; overflow stays with
            // the patron that caused it.
            credit_pool -= 1.0;
        }
    }

    AllocationResult::new(cells, credit_pool.max(0.0), pending)
}

/// Fill one jointly owned cell from the pending set.
///
/// Selects pending shares greedily by descending fraction (ties by
/// ascending patron id) until the selection reaches one unit. The patron
/// whose share closed the group keeps the overflow as their residual
/// fraction and stays pending, in their original position; everyone else
/// selected is fully settled and removed.
fn fill_cell(id: CellId, pending: &mut Vec<Share>) -> Cell {
    let mut order: Vec<usize> = (0..pending.len()).collect();
    order.sort_by(|&a, &b| {
        pending[b]
            .fraction
            .total_cmp(&pending[a].fraction)
            .then_with(|| pending[a].patron.cmp(&pending[b].patron))
    });

    let mut selected = vec![false; pending.len()];
    let mut adopters: Vec<Adopter> = Vec::new();
    let mut sum = 0.0_f64;
    let mut closer = 0_usize;

    for &idx in &order {
        selected[idx] = true;
        adopters.push(Adopter {
            patron: pending[idx].patron,
            contribution: pending[idx].fraction,
        });
        sum += pending[idx].fraction;
        closer = idx;
        if sum >= 1.0 - EPSILON {
            break;
        }
    }

    let overflow = sum - 1.0;
    if overflow > EPSILON {
        // The closing patron only devotes the part that fit.
        if let Some(last) = adopters.last_mut() {
            last.contribution -= overflow;
        }
        pending[closer].fraction = overflow;
        selected[closer] = false;
    }

    let mut idx = 0;
    pending.retain(|_| {
        let keep = !selected[idx];
        idx += 1;
        keep
    });

    Cell::pooled(id, adopters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_patron::{PatronId, PatronRoster, PledgeRecord};

    const CELL_PRICE: u64 = 50;

    fn roster(pledges: &[(u64, i64)]) -> PatronRoster {
        PatronRoster::build(
            pledges.iter().map(|&(id, pledge)| PledgeRecord {
                id: PatronId(id),
                name: format!("Patron {id}"),
                anonymous: false,
                pledge,
            }),
            CELL_PRICE,
        )
        .unwrap()
    }

    fn adopter_ids(cell: &Cell) -> Vec<u64> {
        cell.adopter_ids().map(|id| id.value()).collect()
    }

    #[test]
    fn whole_cells_then_joint_cell_then_whole_cell() {
        // A=150 yields 3 whole cells, B=20 and C=30 pool to one joint
        // cell, D=50 yields 1 whole cell.
        let roster = roster(&[(1, 150), (2, 20), (3, 30), (4, 50)]);
        let result = allocate(&roster);

        assert_eq!(result.cells().len(), 5);
        for (i, cell) in result.cells().iter().enumerate() {
            assert_eq!(cell.id().value(), i as u64 + 1);
        }

        assert_eq!(adopter_ids(&result.cells()[0]), vec![1]);
        assert_eq!(adopter_ids(&result.cells()[1]), vec![1]);
        assert_eq!(adopter_ids(&result.cells()[2]), vec![1]);
        // C's 0.6 outranks B's 0.4 in the greedy fill.
        assert_eq!(adopter_ids(&result.cells()[3]), vec![3, 2]);
        assert_eq!(adopter_ids(&result.cells()[4]), vec![4]);

        assert_eq!(result.remaining_credit(), 0.0);
        assert!(result.pending().is_empty());
        assert!(result.verify_conservation(roster.total_cell_units()).is_ok());
    }

    #[test]
    fn equal_fractions_pool_and_leave_a_pending_patron() {
        // A=25 and B=25 pool to one joint cell; C=10 stays pending.
        let roster = roster(&[(1, 25), (2, 25), (3, 10)]);
        let result = allocate(&roster);

        assert_eq!(result.cells().len(), 1);
        assert_eq!(adopter_ids(&result.cells()[0]), vec![1, 2]);

        assert!((result.remaining_credit() - 0.2).abs() < EPSILON);
        assert_eq!(
            result.pending_ids().collect::<Vec<_>>(),
            vec![PatronId(3)]
        );
        assert!((result.pending()[0].fraction - 0.2).abs() < EPSILON);
        assert!(result.verify_conservation(roster.total_cell_units()).is_ok());
    }

    #[test]
    fn zero_pledge_yields_nothing() {
        let roster = roster(&[(1, 0)]);
        let result = allocate(&roster);

        assert!(result.cells().is_empty());
        assert_eq!(result.remaining_credit(), 0.0);
        assert!(result.pending().is_empty());
        assert!(result.verify_conservation(0.0).is_ok());
    }

    #[test]
    fn empty_roster_yields_empty_result() {
        let result = allocate(&PatronRoster::new());
        assert!(result.cells().is_empty());
        assert_eq!(result.remaining_credit(), 0.0);
        assert!(result.pending().is_empty());
    }

    #[test]
    fn wholeness_precedence() {
        // A patron with exactly 3.0 units yields exactly 3 wholly owned
        // cells and contributes nothing to pooling.
        let roster = roster(&[(1, 150), (2, 20)]);
        let result = allocate(&roster);

        let owned_by_1: Vec<_> = result
            .cells()
            .iter()
            .filter(|c| c.adopter_ids().any(|id| id == PatronId(1)))
            .collect();
        assert_eq!(owned_by_1.len(), 3);
        assert!(owned_by_1.iter().all(|c| !c.is_joint()));
        assert!(result.pending_ids().all(|id| id != PatronId(1)));
    }

    #[test]
    fn overflow_stays_with_the_closing_patron() {
        // 0.7 + 0.6 = 1.3: one joint cell absorbs exactly one unit and
        // the closing patron keeps 0.3 pending.
        let roster = roster(&[(1, 35), (2, 30)]);
        let result = allocate(&roster);

        assert_eq!(result.cells().len(), 1);
        let cell = &result.cells()[0];
        assert_eq!(adopter_ids(cell), vec![1, 2]);
        assert!((cell.adopters()[0].contribution - 0.7).abs() < EPSILON);
        assert!((cell.adopters()[1].contribution - 0.3).abs() < EPSILON);
        assert!((cell.absorbed() - 1.0).abs() < EPSILON);

        assert_eq!(result.pending_ids().collect::<Vec<_>>(), vec![PatronId(2)]);
        assert!((result.pending()[0].fraction - 0.3).abs() < EPSILON);
        assert!((result.remaining_credit() - 0.3).abs() < EPSILON);
        assert!(result.verify_conservation(roster.total_cell_units()).is_ok());
    }

    #[test]
    fn carried_overflow_joins_later_groups() {
        // 0.9 + 0.9 fills a cell and carries 0.8; the carried share then
        // closes the next group with 0.9 from the third patron.
        let roster = roster(&[(1, 45), (2, 45), (3, 45)]);
        let result = allocate(&roster);

        assert_eq!(result.cells().len(), 2);
        assert_eq!(adopter_ids(&result.cells()[0]), vec![1, 2]);
        assert_eq!(adopter_ids(&result.cells()[1]), vec![3, 2]);

        // 2.7 units in: 2 cells plus 0.7 pending with patron 2.
        assert_eq!(result.pending_ids().collect::<Vec<_>>(), vec![PatronId(2)]);
        assert!((result.remaining_credit() - 0.7).abs() < EPSILON);
        assert!(result.verify_conservation(roster.total_cell_units()).is_ok());
    }

    #[test]
    fn ties_break_by_ascending_patron_id() {
        // Input order 2 then 1, equal fractions: patron 1 is selected
        // first anyway.
        let roster = roster(&[(2, 25), (1, 25)]);
        let result = allocate(&roster);

        assert_eq!(result.cells().len(), 1);
        assert_eq!(adopter_ids(&result.cells()[0]), vec![1, 2]);
    }

    #[test]
    fn determinism_is_bit_identical() {
        let roster = roster(&[(1, 35), (2, 30), (3, 45), (4, 10), (5, 125), (6, 5)]);
        let first = allocate(&roster);
        let second = allocate(&roster);
        assert_eq!(first, second);
    }

    #[test]
    fn no_double_counting() {
        // Every patron's cell units must be reconstructible from their
        // contributions across all cells plus their pending fraction.
        let roster = roster(&[(1, 35), (2, 30), (3, 45), (4, 10), (5, 125), (6, 5), (7, 80)]);
        let result = allocate(&roster);

        for patron in &roster {
            let in_cells: f64 = result
                .cells()
                .iter()
                .flat_map(|c| c.adopters())
                .filter(|a| a.patron == patron.id())
                .map(|a| a.contribution)
                .sum();
            let pending: f64 = result
                .pending()
                .iter()
                .filter(|s| s.patron == patron.id())
                .map(|s| s.fraction)
                .sum();

            assert!(
                (in_cells + pending - patron.cell_units()).abs() < EPSILON,
                "patron {} contributed {} but pledged {} units",
                patron.id(),
                in_cells + pending,
                patron.cell_units()
            );
        }
    }

    #[test]
    fn grouping_closure() {
        let roster = roster(&[
            (1, 45),
            (2, 35),
            (3, 30),
            (4, 20),
            (5, 15),
            (6, 10),
            (7, 5),
            (8, 40),
        ]);
        let result = allocate(&roster);

        for cell in result.cells() {
            assert!(!cell.adopters().is_empty());
            let absorbed = cell.absorbed();
            assert!(
                (absorbed - 1.0).abs() <= EPSILON + 1e-9,
                "cell {} absorbed {absorbed}",
                cell.id()
            );
        }
        assert!(result.verify_conservation(roster.total_cell_units()).is_ok());
    }

    #[test]
    fn carryover_reinjection_converges() {
        // Scenario: A=25, B=25, C=10 leaves C pending with 0.2. Feeding
        // the carryover back with a fresh 0.8-unit pledge absorbs it.
        let first_roster = roster(&[(1, 25), (2, 25), (3, 10)]);
        let first = allocate(&first_roster);
        assert_eq!(first.pending_ids().collect::<Vec<_>>(), vec![PatronId(3)]);

        let mut second_roster = PatronRoster::new();
        for patron in first.carryover_patrons(&first_roster) {
            second_roster.append(patron);
        }
        second_roster.append(
            mosaic_patron::Patron::from_record(
                PledgeRecord {
                    id: PatronId(4),
                    name: "Patron 4".into(),
                    anonymous: false,
                    pledge: 40,
                },
                CELL_PRICE,
            )
            .unwrap(),
        );

        let second = allocate(&second_roster);
        assert_eq!(second.cells().len(), 1);
        assert_eq!(adopter_ids(&second.cells()[0]), vec![4, 3]);
        assert!(second.pending().is_empty());
        assert!(second.remaining_credit() < EPSILON);
    }

    #[test]
    fn carryover_alone_stays_bounded() {
        // A pending fraction re-injected on its own never grows and never
        // produces a degenerate cell.
        let first_roster = roster(&[(1, 25), (2, 25), (3, 10)]);
        let mut result = allocate(&first_roster);
        let mut carry_roster = first_roster;

        for _ in 0..5 {
            let mut next = PatronRoster::new();
            for patron in result.carryover_patrons(&carry_roster) {
                next.append(patron);
            }
            result = allocate(&next);
            assert!(result.cells().is_empty());
            assert!((result.remaining_credit() - 0.2).abs() < EPSILON);
            assert_eq!(result.pending_ids().collect::<Vec<_>>(), vec![PatronId(3)]);
            carry_roster = next;
        }
    }

    #[test]
    fn conservation_over_many_shapes() {
        let shapes: Vec<Vec<(u64, i64)>> = vec![
            vec![],
            vec![(1, 0)],
            vec![(1, 49)],
            vec![(1, 50)],
            vec![(1, 51)],
            vec![(1, 25), (2, 25)],
            vec![(1, 25), (2, 25), (3, 10)],
            vec![(1, 150), (2, 20), (3, 30), (4, 50)],
            vec![(1, 45), (2, 45), (3, 45), (4, 45)],
            vec![(1, 1), (2, 1), (3, 1), (4, 1), (5, 1)],
            (1..=50).map(|i| (i, (i as i64 * 13) % 177)).collect(),
        ];

        for pledges in shapes {
            let roster = roster(&pledges);
            let result = allocate(&roster);
            assert!(
                result.verify_conservation(roster.total_cell_units()).is_ok(),
                "conservation failed for {pledges:?}"
            );
            assert!(result.remaining_credit() >= 0.0);
            assert!(result.remaining_credit() < 1.0);
        }
    }
}
