use crate::instance::Instance;
use crate::model::{Comparison, LinearExpr, Model, VarGrid};

/// Creates one placement variable per (item, group), item-major.
pub fn init_placement_variables(model: &mut Model, instance: &Instance) -> VarGrid {
    VarGrid::new(model, "x", instance.num_items(), instance.num_groups())
}

/// Add the base assignment constraints: uniqueness, then minimum group sizes
pub fn constrain_assignment(model: Model, instance: &Instance, placement: &VarGrid) -> Model {
    let model = constrain_each_item_placed_once(model, instance, placement);
    constrain_group_min_sizes(model, instance, placement)
}

/// Every item lands in exactly one group
fn constrain_each_item_placed_once(
    model: Model,
    instance: &Instance,
    placement: &VarGrid,
) -> Model {
    (0..instance.num_items()).fold(model, |mut m, item| {
        let groups_holding_item: LinearExpr = placement.row(item).collect();
        m.add_linear(groups_holding_item, Comparison::Eq, 1);
        m
    })
}

/// Every group holds at least its minimum occupancy
fn constrain_group_min_sizes(model: Model, instance: &Instance, placement: &VarGrid) -> Model {
    (0..instance.num_groups()).fold(model, |mut m, group| {
        let occupancy: LinearExpr = placement.col(group).collect();
        m.add_linear(occupancy, Comparison::Geq, i64::from(instance.min_size(group)));
        m
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> Instance {
        Instance::new(vec![vec![0], vec![1]], vec![vec![0], vec![0]], vec![1, 0]).unwrap()
    }

    #[test]
    fn adds_uniqueness_before_min_size() {
        let instance = two_by_two();
        let mut model = Model::new();
        let x = init_placement_variables(&mut model, &instance);
        let model = constrain_assignment(model, &instance, &x);

        let constraints = model.constraints();
        assert_eq!(constraints.len(), 4);
        assert!(
            constraints[..2]
                .iter()
                .all(|c| c.comparison == Comparison::Eq && c.rhs == 1)
        );
        assert_eq!(constraints[2].comparison, Comparison::Geq);
        assert_eq!(constraints[2].rhs, 1);
        assert_eq!(constraints[3].rhs, 0);
        assert!(constraints.iter().all(|c| c.enforce_if.is_none()));
        assert!(model.objective().is_none());
    }

    #[test]
    fn accepts_only_complete_assignments() {
        let instance = two_by_two();
        let mut model = Model::new();
        let x = init_placement_variables(&mut model, &instance);
        let model = constrain_assignment(model, &instance, &x);

        // item0 → g0, item1 → g1
        assert!(model.is_satisfied_by(&[true, false, false, true]));
        // both in g1 leaves g0 below its minimum
        assert!(!model.is_satisfied_by(&[false, true, false, true]));
        // item1 unplaced
        assert!(!model.is_satisfied_by(&[true, false, false, false]));
        // item0 placed twice
        assert!(!model.is_satisfied_by(&[true, true, true, false]));
    }
}
