use booklet_impose::*;

fn pages(side: &SheetSide) -> (Option<usize>, Option<usize>) {
    (side.left.page(), side.right.page())
}

#[test]
fn test_plan_property_up_to_200_pages() {
    for n in 1..=200 {
        let plan = plan(n, true).unwrap();
        assert_eq!(plan.sides.len(), n.div_ceil(4) * 2, "side count for {}", n);
        plan.verify().unwrap_or_else(|e| panic!("{} pages: {}", n, e));

        let read = plan.fold_and_read();
        let real: Vec<usize> = read.iter().filter_map(|s| s.page()).collect();
        assert_eq!(real, (1..=n).collect::<Vec<_>>());

        // Blanks only at the tail
        let first_blank = read.iter().position(|s| s.is_blank()).unwrap_or(read.len());
        assert!(read[first_blank..].iter().all(|s| s.is_blank()));
        assert_eq!(first_blank, n);
    }
}

#[test]
fn test_every_page_placed_exactly_once() {
    for n in [3, 9, 17, 64] {
        let plan = plan(n, true).unwrap();
        let mut seen: Vec<usize> = plan
            .sides
            .iter()
            .flat_map(|s| [s.left, s.right])
            .filter_map(|s| s.page())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=n).collect::<Vec<_>>());
    }
}

#[test]
fn test_five_pages_blanks_on_outer_sheet() {
    let plan = plan(5, true).unwrap();
    assert_eq!(plan.sheet_count(), 2);
    assert_eq!(plan.blank_count(), 3);

    let got: Vec<_> = plan.sides.iter().map(pages).collect();
    assert_eq!(
        got,
        vec![
            (None, Some(1)),
            (Some(2), None),
            (None, Some(3)),
            (Some(4), Some(5)),
        ]
    );
}

#[test]
fn test_unpadded_plans_still_read_in_order() {
    for n in 1..=40 {
        let plan = plan(n, false).unwrap();
        assert!(plan.sides.iter().all(|s| !s.is_blank()));
        plan.verify().unwrap();
        for (idx, side) in plan.sides.iter().enumerate() {
            assert_eq!(side.page_number, idx + 1);
        }
    }
    assert_eq!(plan(5, false).unwrap().sides.len(), 4);
    assert_eq!(plan(9, false).unwrap().sides.len(), 6);
    assert_eq!(plan(1, false).unwrap().sides.len(), 1);
}

#[test]
fn test_plan_is_sorted_by_sheet_then_face() {
    let plan = plan(24, true).unwrap();
    let keys: Vec<_> = plan.sides.iter().map(|s| s.order_key()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert_eq!(plan.sides[0].order_key(), (0, Face::Front));
    assert_eq!(plan.sides[1].order_key(), (0, Face::Back));
}
