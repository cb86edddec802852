//! # Model Families
//!
//! The second stage of the inference pipeline: a fitted predictor mapping a
//! standardised feature vector to one [`Prediction`].
//!
//! Three parameter-file families are supported:
//!
//! | Family | Output | Parameters |
//! |--------|--------|------------|
//! | `LinearRegression` | score | `coefficients`, `intercept` |
//! | `LogisticRegression` | class | `classes`, `coefficients`, `intercepts` |
//! | `RandomForest` | class or score | `task`, `n_features`, flat-array `trees` |
//!
//! Every family validates its parameters once at load time so that
//! `predict` can only fail on the input shape.

use crate::primitives::{MAX_FEATURES, MAX_TREE_NODES};
use crate::{OutputKind, Prediction, Result, SmartRaiseError};
use serde::{Deserialize, Serialize};

// =============================================================================
// MODEL TRAIT
// =============================================================================

/// A fitted predictor.
///
/// Implementations are immutable after construction and shared read-only
/// across request handlers.
pub trait Model: Send + Sync {
    /// Number of (standardised) features the model expects.
    fn n_features(&self) -> usize;

    /// Kind of value `predict` returns.
    fn output_kind(&self) -> OutputKind;

    /// Predict from a standardised feature vector.
    fn predict(&self, x: &[f64]) -> Result<Prediction>;
}

fn check_shape(expected: usize, x: &[f64]) -> Result<()> {
    if x.len() != expected {
        return Err(SmartRaiseError::FeatureShapeMismatch {
            expected,
            actual: x.len(),
        });
    }
    Ok(())
}

fn corrupt(family: &str, msg: impl Into<String>) -> SmartRaiseError {
    SmartRaiseError::ArtifactCorrupt(format!("{}: {}", family, msg.into()))
}

fn check_finite(family: &str, what: &str, values: &[f64]) -> Result<()> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(corrupt(family, format!("{}[{}] is not finite", what, i)));
    }
    Ok(())
}

fn check_feature_count(family: &str, n: usize) -> Result<()> {
    if n == 0 || n > MAX_FEATURES {
        return Err(corrupt(
            family,
            format!("feature count {} outside 1..={}", n, MAX_FEATURES),
        ));
    }
    Ok(())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Index of the largest value; ties resolve to the lowest index.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

// =============================================================================
// LINEAR REGRESSION
// =============================================================================

/// Ordinary linear model: `y = coefficients · x + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    const FAMILY: &'static str = "linear_regression";

    pub fn validate(&self) -> Result<()> {
        check_feature_count(Self::FAMILY, self.coefficients.len())?;
        check_finite(Self::FAMILY, "coefficients", &self.coefficients)?;
        check_finite(Self::FAMILY, "intercept", &[self.intercept])
    }
}

impl Model for LinearRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Score
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        check_shape(self.coefficients.len(), x)?;
        Ok(Prediction::Score(dot(&self.coefficients, x) + self.intercept))
    }
}

// =============================================================================
// LOGISTIC REGRESSION
// =============================================================================

/// Linear classifier choosing the class with the highest decision value.
///
/// Binary models carry a single coefficient row: a positive decision value
/// selects `classes[1]`, otherwise `classes[0]`. Multiclass models carry one
/// row per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<i64>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LogisticRegression {
    const FAMILY: &'static str = "logistic_regression";

    pub fn validate(&self) -> Result<()> {
        if self.classes.len() < 2 {
            return Err(corrupt(Self::FAMILY, "at least two classes required"));
        }
        let rows = if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        };
        if self.coefficients.len() != rows {
            return Err(corrupt(
                Self::FAMILY,
                format!(
                    "{} classes need {} coefficient rows, found {}",
                    self.classes.len(),
                    rows,
                    self.coefficients.len()
                ),
            ));
        }
        if self.intercepts.len() != rows {
            return Err(corrupt(
                Self::FAMILY,
                format!("expected {} intercepts, found {}", rows, self.intercepts.len()),
            ));
        }
        let n = self.coefficients[0].len();
        check_feature_count(Self::FAMILY, n)?;
        for (i, row) in self.coefficients.iter().enumerate() {
            if row.len() != n {
                return Err(corrupt(
                    Self::FAMILY,
                    format!("coefficient row {} has {} entries, expected {}", i, row.len(), n),
                ));
            }
            check_finite(Self::FAMILY, "coefficients", row)?;
        }
        check_finite(Self::FAMILY, "intercepts", &self.intercepts)
    }

    /// Raw decision values, one per coefficient row.
    pub fn decision_function(&self, x: &[f64]) -> Result<Vec<f64>> {
        check_shape(self.n_features(), x)?;
        Ok(self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| dot(row, x) + b)
            .collect())
    }
}

impl Model for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn output_kind(&self) -> OutputKind {
        OutputKind::Class
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        let scores = self.decision_function(x)?;
        if scores.iter().any(|s| s.is_nan()) {
            return Err(SmartRaiseError::MalformedRequest(
                "decision value is not a number".to_string(),
            ));
        }
        let index = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores)
        };
        Ok(Prediction::Class(self.classes[index]))
    }
}

// =============================================================================
// RANDOM FOREST
// =============================================================================

/// Marker for "no child" in the flat tree arrays.
pub const LEAF: i32 = -1;

/// A binary decision tree in flat-array form.
///
/// Node `i` is a leaf when `left[i] == LEAF`. Otherwise the walk goes to
/// `left[i]` when `x[feature[i]] <= threshold[i]` and to `right[i]` otherwise.
/// `value[i]` holds class weights (classification) or a single value
/// (regression) and is only read at leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub left: Vec<i32>,
    pub right: Vec<i32>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, value_width: usize, tree: usize) -> Result<()> {
        let family = RandomForest::FAMILY;
        let n = self.feature.len();
        if n == 0 || n > MAX_TREE_NODES {
            return Err(corrupt(
                family,
                format!("tree {} has {} nodes, expected 1..={}", tree, n, MAX_TREE_NODES),
            ));
        }
        if self.threshold.len() != n
            || self.left.len() != n
            || self.right.len() != n
            || self.value.len() != n
        {
            return Err(corrupt(family, format!("tree {} arrays differ in length", tree)));
        }

        for i in 0..n {
            if self.left[i] == LEAF {
                let leaf = &self.value[i];
                if leaf.len() != value_width {
                    return Err(corrupt(
                        family,
                        format!(
                            "tree {} leaf {} has {} values, expected {}",
                            tree,
                            i,
                            leaf.len(),
                            value_width
                        ),
                    ));
                }
                check_finite(family, "value", leaf)?;
                continue;
            }

            let feature = usize::try_from(self.feature[i]).ok();
            if feature.is_none_or(|f| f >= n_features) {
                return Err(corrupt(
                    family,
                    format!("tree {} node {} splits on feature {}", tree, i, self.feature[i]),
                ));
            }
            if !self.threshold[i].is_finite() {
                return Err(corrupt(
                    family,
                    format!("tree {} node {} threshold is not finite", tree, i),
                ));
            }
            // Children must come after their parent: guarantees the walk ends.
            for child in [self.left[i], self.right[i]] {
                let ok = usize::try_from(child).is_ok_and(|c| c > i && c < n);
                if !ok {
                    return Err(corrupt(
                        family,
                        format!("tree {} node {} has invalid child {}", tree, i, child),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf and return its values.
    fn leaf_values(&self, x: &[f64]) -> &[f64] {
        let mut node = 0usize;
        while self.left[node] != LEAF {
            let feature = self.feature[node] as usize;
            let next = if x[feature] <= self.threshold[node] {
                self.left[node]
            } else {
                self.right[node]
            };
            node = next as usize;
        }
        &self.value[node]
    }
}

/// What a forest predicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForestTask {
    /// Average per-tree class probabilities, pick the most probable class.
    Classification { classes: Vec<i64> },
    /// Average per-tree leaf values.
    Regression,
}

/// Bagged ensemble of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub task: ForestTask,
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    const FAMILY: &'static str = "random_forest";

    pub fn validate(&self) -> Result<()> {
        check_feature_count(Self::FAMILY, self.n_features)?;
        if self.trees.is_empty() {
            return Err(corrupt(Self::FAMILY, "forest has no trees"));
        }
        let width = match &self.task {
            ForestTask::Classification { classes } => {
                if classes.len() < 2 {
                    return Err(corrupt(Self::FAMILY, "at least two classes required"));
                }
                classes.len()
            }
            ForestTask::Regression => 1,
        };
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, width, i)?;
        }
        Ok(())
    }

    /// Mean class probabilities across trees (classification only).
    ///
    /// Each leaf's class weights are normalised to sum to one before
    /// averaging; an all-zero leaf contributes nothing.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        check_shape(self.n_features, x)?;
        let ForestTask::Classification { classes } = &self.task else {
            return Err(SmartRaiseError::MalformedRequest(
                "predict_proba requires a classification forest".to_string(),
            ));
        };
        let mut proba = vec![0.0; classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_values(x);
            let total: f64 = leaf.iter().sum();
            if total > 0.0 {
                for (p, w) in proba.iter_mut().zip(leaf) {
                    *p += w / total;
                }
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }
}

impl Model for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn output_kind(&self) -> OutputKind {
        match self.task {
            ForestTask::Classification { .. } => OutputKind::Class,
            ForestTask::Regression => OutputKind::Score,
        }
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        check_shape(self.n_features, x)?;
        match &self.task {
            ForestTask::Classification { classes } => {
                let proba = self.predict_proba(x)?;
                Ok(Prediction::Class(classes[argmax(&proba)]))
            }
            ForestTask::Regression => {
                let sum: f64 = self.trees.iter().map(|t| t.leaf_values(x)[0]).sum();
                Ok(Prediction::Score(sum / self.trees.len() as f64))
            }
        }
    }
}

// =============================================================================
// MODEL SPEC (closed set of families)
// =============================================================================

/// Any supported model family, as stored in an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelSpec {
    LinearRegression(LinearRegression),
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl ModelSpec {
    /// Stable family name, as used in the JSON `kind` tag.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::LinearRegression(_) => LinearRegression::FAMILY,
            Self::LogisticRegression(_) => LogisticRegression::FAMILY,
            Self::RandomForest(_) => RandomForest::FAMILY,
        }
    }

    /// Validate the wrapped parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::LinearRegression(m) => m.validate(),
            Self::LogisticRegression(m) => m.validate(),
            Self::RandomForest(m) => m.validate(),
        }
    }

    fn inner(&self) -> &dyn Model {
        match self {
            Self::LinearRegression(m) => m,
            Self::LogisticRegression(m) => m,
            Self::RandomForest(m) => m,
        }
    }
}

impl Model for ModelSpec {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn output_kind(&self) -> OutputKind {
        self.inner().output_kind()
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        self.inner().predict(x)
    }
}

// =============================================================================
// TESTS
// =============================================================================
