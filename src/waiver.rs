//! Property-waiver layer on top of the base assignment.
//!
//! A group's requirement for a property is met when at least one item placed
//! in the group reaches [`SATISFACTION_LEVEL`] for it. A requirement can be
//! waived instead, at the group/property cost; the objective minimises the
//! total cost of waivers.

use crate::instance::{Instance, LevelTensor, SATISFACTION_LEVEL};
use crate::model::{Comparison, LinearExpr, Model, VarGrid};

/// Creates one waiver variable per (group, property), group-major.
pub fn init_waiver_variables(model: &mut Model, instance: &Instance) -> VarGrid {
    VarGrid::new(model, "y", instance.num_groups(), instance.num_properties())
}

/// Add eligibility, satisfaction and the waiver-cost objective
pub fn constrain_waivers(
    model: Model,
    instance: &Instance,
    levels: &LevelTensor,
    placement: &VarGrid,
    waivers: &VarGrid,
) -> Model {
    let model = constrain_waivers_to_requirements(model, instance, waivers);
    let model = if instance.has_requirements() {
        constrain_requirements_satisfied(model, instance, levels, placement, waivers)
    } else {
        model
    };
    set_waiver_cost_objective(model, instance, waivers)
}

/// `y[j][k] <= requires[j][k]`: only requirements a group actually has can be waived
fn constrain_waivers_to_requirements(
    model: Model,
    instance: &Instance,
    waivers: &VarGrid,
) -> Model {
    group_properties(instance).fold(model, |mut m, (group, property)| {
        let waived: LinearExpr = [waivers.get(group, property)].into_iter().collect();
        let required = i64::from(instance.requires(group, property));
        m.add_linear(waived, Comparison::Leq, required);
        m
    })
}

/// Unless waived, a required property is held at level >= 2 by some item in the group
fn constrain_requirements_satisfied(
    model: Model,
    instance: &Instance,
    levels: &LevelTensor,
    placement: &VarGrid,
    waivers: &VarGrid,
) -> Model {
    group_properties(instance)
        .filter(|&(group, property)| instance.requires(group, property))
        .fold(model, |mut m, (group, property)| {
            // Items below the threshold have a zero coefficient and are left out
            let qualified_members: LinearExpr = (0..instance.num_items())
                .filter(|&item| levels.has_level(SATISFACTION_LEVEL, item, property))
                .map(|item| placement.get(item, group))
                .collect();
            m.add_linear(qualified_members, Comparison::Geq, 1)
                .only_enforce_if(waivers.get(group, property).is_false());
            m
        })
}

fn set_waiver_cost_objective(mut model: Model, instance: &Instance, waivers: &VarGrid) -> Model {
    let total_cost: LinearExpr = group_properties(instance)
        .map(|(group, property)| (waivers.get(group, property), instance.cost(group, property)))
        .collect();
    model.minimise(total_cost);
    model
}

/// All (group, property) pairs, group-major
fn group_properties(instance: &Instance) -> impl Iterator<Item = (usize, usize)> {
    let num_properties = instance.num_properties();
    (0..instance.num_groups())
        .flat_map(move |group| (0..num_properties).map(move |property| (group, property)))
}
