//! Engine-neutral MILP model
//!
//! Both optimisers describe their problem as a [`MilpModel`]: declared
//! variables with a domain and bounds, labelled linear constraints, and one
//! objective. Engines translate the model; nothing here depends on a solver.

use crate::error::ModelBuildError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::{Add, Mul, Neg, Sub};

/// Handle of a declared variable (ordinal in declaration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Variable domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarDomain {
    Continuous,
    Integer,
    Binary,
}

/// Declared decision variable
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub domain: VarDomain,
    pub lower: f64,
    /// `None` means unbounded above
    pub upper: Option<f64>,
}

/// Linear expression `Σ coef · var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Builder form of [`LinExpr::add_term`]
    pub fn term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Sum of `coef · var` over an iterator of pairs
    pub fn sum<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (VarId, f64)>,
    {
        Self {
            terms: pairs.into_iter().collect(),
            constant: 0.0,
        }
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Value of the expression at a point indexed by [`VarId`]
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    fn is_finite(&self) -> bool {
        self.constant.is_finite() && self.terms.iter().all(|(_, c)| c.is_finite())
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr::new().term(var, 1.0)
    }
}

impl Add for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;

    fn sub(self, rhs: LinExpr) -> LinExpr {
        self + (-rhs)
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(mut self, rhs: f64) -> LinExpr {
        for (_, coef) in &mut self.terms {
            *coef *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

/// Relational operator of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

/// Labelled linear constraint `expr <relation> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub label: String,
    pub expr: LinExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Signed violation at a point (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.evaluate(values);
        match self.relation {
            Relation::Le => (lhs - self.rhs).max(0.0),
            Relation::Ge => (self.rhs - lhs).max(0.0),
            Relation::Eq => (lhs - self.rhs).abs(),
        }
    }
}

/// Optimisation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sense {
    #[default]
    Maximize,
    Minimize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub expr: LinExpr,
    pub sense: Sense,
}

/// A mixed-integer linear program
#[derive(Debug, Clone)]
pub struct MilpModel {
    name: String,
    vars: Vec<VarDecl>,
    constraints: Vec<LinearConstraint>,
    labels: HashSet<String>,
    objective: Option<Objective>,
}

impl MilpModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
            labels: HashSet::new(),
            objective: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a variable. Binary variables always live in `[0, 1]`.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        domain: VarDomain,
        lower: f64,
        upper: Option<f64>,
    ) -> Result<VarId, ModelBuildError> {
        let name = name.into();
        let (lower, upper) = match domain {
            VarDomain::Binary => (0.0, Some(1.0)),
            _ => (lower, upper),
        };
        let upper_value = upper.unwrap_or(f64::INFINITY);
        if !lower.is_finite() || upper_value.is_nan() || lower > upper_value {
            return Err(ModelBuildError::InvalidBounds {
                name,
                lower,
                upper: upper_value,
            });
        }

        let id = VarId(self.vars.len());
        self.vars.push(VarDecl {
            name,
            domain,
            lower,
            upper,
        });
        Ok(id)
    }

    /// Add a labelled constraint.
    pub fn add_constraint(
        &mut self,
        label: impl Into<String>,
        expr: LinExpr,
        relation: Relation,
        rhs: f64,
    ) -> Result<(), ModelBuildError> {
        let label = label.into();
        if !expr.is_finite() || !rhs.is_finite() {
            return Err(ModelBuildError::NonFinite(format!("constraint '{}'", label)));
        }
        if let Some((var, _)) = expr.terms().iter().find(|(v, _)| v.0 >= self.vars.len()) {
            return Err(ModelBuildError::UnknownVariable {
                label,
                index: var.0,
            });
        }
        if !self.labels.insert(label.clone()) {
            return Err(ModelBuildError::DuplicateLabel(label));
        }
        self.constraints.push(LinearConstraint {
            label,
            expr,
            relation,
            rhs,
        });
        Ok(())
    }

    pub fn set_objective(&mut self, expr: LinExpr, sense: Sense) -> Result<(), ModelBuildError> {
        if !expr.is_finite() {
            return Err(ModelBuildError::NonFinite(format!("objective of '{}'", self.name)));
        }
        if let Some((var, _)) = expr.terms().iter().find(|(v, _)| v.0 >= self.vars.len()) {
            return Err(ModelBuildError::UnknownVariable {
                label: "objective".to_string(),
                index: var.0,
            });
        }
        self.objective = Some(Objective { expr, sense });
        Ok(())
    }

    pub fn objective(&self) -> Result<&Objective, ModelBuildError> {
        self.objective
            .as_ref()
            .ok_or_else(|| ModelBuildError::MissingObjective(self.name.clone()))
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.0]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.vars.iter().any(|v| v.domain != VarDomain::Continuous)
    }

    /// LP relaxation: every integer and binary variable becomes continuous.
    pub fn relaxed(&self) -> MilpModel {
        let mut relaxed = self.clone();
        relaxed.name = format!("{}_relaxation", self.name);
        for var in &mut relaxed.vars {
            var.domain = VarDomain::Continuous;
        }
        relaxed
    }

    /// Round integer-domain values to the nearest integer.
    pub fn snap_integral(&self, values: &mut [f64]) {
        for (var, value) in self.vars.iter().zip(values.iter_mut()) {
            if var.domain != VarDomain::Continuous {
                *value = value.round();
            }
        }
    }

    /// Labels of constraints violated by more than `tolerance` at a point.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| c.violation(values) > tolerance)
            .map(|c| c.label.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_algebra() {
        let x = VarId(0);
        let y = VarId(1);
        let expr = (LinExpr::from(x) * 3.0 - LinExpr::from(y)) + LinExpr::constant(2.0);
        assert_eq!(expr.evaluate(&[1.0, 4.0]), 1.0);
        assert_eq!((-expr).evaluate(&[1.0, 4.0]), -1.0);
    }

    #[test]
    fn test_binary_bounds_are_forced() {
        let mut model = MilpModel::new("test");
        let w = model.add_var("w", VarDomain::Binary, -5.0, Some(9.0)).unwrap();
        assert_eq!(model.var(w).lower, 0.0);
        assert_eq!(model.var(w).upper, Some(1.0));
    }

    #[test]
    fn test_rejects_bad_bounds() {
        let mut model = MilpModel::new("test");
        let err = model
            .add_var("x", VarDomain::Integer, 3.0, Some(1.0))
            .unwrap_err();
        assert!(matches!(err, ModelBuildError::InvalidBounds { .. }));
        assert!(model
            .add_var("y", VarDomain::Continuous, f64::NEG_INFINITY, None)
            .is_err());
    }

    #[test]
    fn test_rejects_duplicate_labels_and_unknown_vars() {
        let mut model = MilpModel::new("test");
        let x = model.add_var("x", VarDomain::Integer, 0.0, None).unwrap();
        model
            .add_constraint("cap", LinExpr::from(x), Relation::Le, 4.0)
            .unwrap();

        let err = model
            .add_constraint("cap", LinExpr::from(x), Relation::Ge, 1.0)
            .unwrap_err();
        assert_eq!(err, ModelBuildError::DuplicateLabel("cap".into()));

        let err = model
            .add_constraint("ghost", LinExpr::from(VarId(7)), Relation::Le, 1.0)
            .unwrap_err();
        assert!(matches!(err, ModelBuildError::UnknownVariable { index: 7, .. }));

        let err = model
            .add_constraint("nan", LinExpr::from(x), Relation::Le, f64::NAN)
            .unwrap_err();
        assert!(matches!(err, ModelBuildError::NonFinite(_)));
    }

    #[test]
    fn test_missing_objective() {
        let model = MilpModel::new("empty");
        assert_eq!(
            model.objective().unwrap_err(),
            ModelBuildError::MissingObjective("empty".into())
        );
    }

    #[test]
    fn test_relaxation_and_snapping() {
        let mut model = MilpModel::new("test");
        model.add_var("x", VarDomain::Integer, 0.0, Some(10.0)).unwrap();
        model.add_var("c", VarDomain::Continuous, 0.0, None).unwrap();
        model.add_var("w", VarDomain::Binary, 0.0, None).unwrap();
        assert!(model.is_mixed_integer());

        let relaxed = model.relaxed();
        assert!(!relaxed.is_mixed_integer());
        assert_eq!(relaxed.var(VarId(2)).upper, Some(1.0));

        let mut values = vec![2.9999999, 0.4, 0.0000001];
        model.snap_integral(&mut values);
        assert_eq!(values, vec![3.0, 0.4, 0.0]);
    }

    #[test]
    fn test_violations() {
        let mut model = MilpModel::new("test");
        let x = model.add_var("x", VarDomain::Integer, 0.0, None).unwrap();
        let y = model.add_var("y", VarDomain::Integer, 0.0, None).unwrap();
        model
            .add_constraint("sum", LinExpr::from(x) + LinExpr::from(y), Relation::Eq, 5.0)
            .unwrap();
        model
            .add_constraint("x_cap", LinExpr::from(x), Relation::Le, 2.0)
            .unwrap();

        assert!(model.violations(&[2.0, 3.0], 1e-9).is_empty());
        assert_eq!(model.violations(&[3.0, 3.0], 1e-9), vec!["sum", "x_cap"]);
    }
}
