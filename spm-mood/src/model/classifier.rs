//! Probabilistic classifiers
//!
//! Both kinds map a standardised feature vector to one probability per
//! class, in the classifier's own class order.

use super::artifact::{ClassifierParams, ForestParams, LogisticParams, TreeParams};
use super::ModelLoadError;
use crate::features::FEATURE_COUNT;

/// Validated classifier
#[derive(Debug, Clone)]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl Classifier {
    pub fn from_params(params: &ClassifierParams) -> Result<Self, ModelLoadError> {
        let classifier = match params {
            ClassifierParams::LogisticRegression(p) => {
                Classifier::LogisticRegression(LogisticRegression::from_params(p)?)
            }
            ClassifierParams::RandomForest(p) => Classifier::RandomForest(RandomForest::from_params(p)?),
        };

        if let Some(classes) = params.classes() {
            if classes.len() != classifier.n_classes() {
                return Err(ModelLoadError::Classifier(format!(
                    "classifier lists {} classes but produces {} outputs",
                    classes.len(),
                    classifier.n_classes()
                )));
            }
        }
        Ok(classifier)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::LogisticRegression(_) => "logistic_regression",
            Classifier::RandomForest(_) => "random_forest",
        }
    }

    /// Output cardinality
    pub fn n_classes(&self) -> usize {
        match self {
            Classifier::LogisticRegression(m) => m.intercept.len(),
            Classifier::RandomForest(m) => m.n_classes,
        }
    }

    /// Class probabilities for a standardised vector
    pub fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        match self {
            Classifier::LogisticRegression(m) => m.predict_proba(x),
            Classifier::RandomForest(m) => m.predict_proba(x),
        }
    }
}

/// Multinomial logistic regression
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coef: Vec<[f64; FEATURE_COUNT]>,
    intercept: Vec<f64>,
}

impl LogisticRegression {
    fn from_params(params: &LogisticParams) -> Result<Self, ModelLoadError> {
        let k = params.intercept.len();
        if k < 2 {
            return Err(ModelLoadError::Classifier(format!(
                "logistic regression needs at least 2 classes (one coef row each), got {}",
                k
            )));
        }
        if params.coef.len() != k {
            return Err(ModelLoadError::Classifier(format!(
                "coef has {} rows but intercept has {} entries",
                params.coef.len(),
                k
            )));
        }

        let mut coef = Vec::with_capacity(k);
        for (i, row) in params.coef.iter().enumerate() {
            let row: [f64; FEATURE_COUNT] = row.as_slice().try_into().map_err(|_| {
                ModelLoadError::Classifier(format!(
                    "coef row {} has {} weights, expected {}",
                    i,
                    row.len(),
                    FEATURE_COUNT
                ))
            })?;
            coef.push(row);
        }

        let all_finite = coef.iter().flatten().chain(&params.intercept).all(|v| v.is_finite());
        if !all_finite {
            return Err(ModelLoadError::Classifier(
                "logistic regression parameters must be finite".to_string(),
            ));
        }

        Ok(Self {
            coef,
            intercept: params.intercept.clone(),
        })
    }

    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect();
        softmax(&logits)
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

/// Random forest (probability averaging over trees)
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(Vec<f64>),
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl RandomForest {
    fn from_params(params: &ForestParams) -> Result<Self, ModelLoadError> {
        let Some(first) = params.trees.first() else {
            return Err(ModelLoadError::Classifier("random forest has no trees".to_string()));
        };
        let n_classes = first.value.first().map(Vec::len).unwrap_or(0);
        if n_classes < 2 {
            return Err(ModelLoadError::Classifier(format!(
                "random forest needs at least 2 classes, got {}",
                n_classes
            )));
        }

        let trees = params
            .trees
            .iter()
            .enumerate()
            .map(|(i, tree)| {
                DecisionTree::from_params(tree, n_classes)
                    .map_err(|msg| ModelLoadError::Classifier(format!("tree {}: {}", i, msg)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trees, n_classes })
    }

    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (s, p) in sum.iter_mut().zip(tree.leaf(x)) {
                *s += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.iter().map(|s| s / n).collect()
    }
}

impl DecisionTree {
    fn from_params(params: &TreeParams, n_classes: usize) -> Result<Self, String> {
        let n = params.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if params.children_right.len() != n
            || params.feature.len() != n
            || params.threshold.len() != n
            || params.value.len() != n
        {
            return Err("node arrays have different lengths".to_string());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (params.children_left[i], params.children_right[i]);
            if left == -1 {
                if right != -1 {
                    return Err(format!("node {} has a right child but no left child", i));
                }
                let value = &params.value[i];
                if value.len() != n_classes {
                    return Err(format!(
                        "leaf {} has {} class weights, expected {}",
                        i,
                        value.len(),
                        n_classes
                    ));
                }
                let total: f64 = value.iter().sum();
                if !(total > 0.0 && total.is_finite()) || value.iter().any(|v| *v < 0.0) {
                    return Err(format!("leaf {} has invalid class weights", i));
                }
                nodes.push(Node::Leaf(value.iter().map(|v| v / total).collect()));
                continue;
            }

            // Children always come after their parent, so traversal terminates
            let in_range = |c: i64| c > i as i64 && (c as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(format!("node {} has out-of-order children", i));
            }
            let feature = params.feature[i];
            if feature < 0 || feature as usize >= FEATURE_COUNT {
                return Err(format!("node {} splits on unknown feature {}", i, feature));
            }
            let threshold = params.threshold[i];
            if !threshold.is_finite() {
                return Err(format!("node {} has a non-finite threshold", i));
            }
            nodes.push(Node::Split {
                feature: feature as usize,
                threshold,
                left: left as usize,
                right: right as usize,
            });
        }

        Ok(Self { nodes })
    }

    fn leaf(&self, x: &[f64; FEATURE_COUNT]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(p) => return p,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // Trees are fitted on single-precision inputs
                    let value = x[*feature] as f32 as f64;
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }
}
