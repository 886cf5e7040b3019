//! Declarative network description.
//!
//! A network is described as an ordered list of layer records. Each record
//! names its operator kind, its input and output tensors, the shapes of any
//! trailing weight tensors, and a kind-specific configuration section with
//! documented defaults. The list order is the execution order: the format
//! guarantees producers precede consumers, and the builder relies on that
//! instead of sorting.
//!
//! Descriptions are parsed from JSON with serde; an unknown layer `type` tag
//! fails the parse (the operator set is a closed enumeration).

use serde::{Deserialize, Serialize};

/// The closed set of operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    BinaryOperation,
    Concat,
    Dropout,
    Eltwise,
    InnerProduct,
    Input,
    Relu,
    Scale,
    Sigmoid,
    Softmax,
    Stub,
    Tanh,
}

/// Binary (two-operand) elementwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BinaryOperation {
    #[default]
    Div,
    Sub,
    Mul,
    Max,
}

/// N-ary elementwise reduction operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EltwiseOperation {
    Product,
    #[default]
    Sum,
    Max,
}

/// Shape descriptor for a weight tensor: sizes only, no data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WeightParam {
    pub dim: Vec<usize>,
}

/// Declared shape for a graph-input tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShapeParam {
    pub dim: Vec<usize>,
}

/// Configuration for `Input` layers.
///
/// When `shape` is non-empty it must carry one entry per declared output and
/// the build-time reshape applies those shapes; when empty, input shapes are
/// whatever the caller sets before calling reshape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InputParam {
    #[serde(default)]
    pub shape: Vec<ShapeParam>,
}

/// Configuration for `Sigmoid` layers: `f(x) = 1 / (1 + exp(-slope * x))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigmoidParam {
    #[serde(default = "default_slope")]
    pub slope: f32,
}

impl Default for SigmoidParam {
    fn default() -> Self {
        Self {
            slope: default_slope(),
        }
    }
}

fn default_slope() -> f32 {
    1.0
}

/// Configuration for `Relu` layers: negative inputs are scaled by
/// `negative_slope` (0 gives the standard rectifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReluParam {
    #[serde(default)]
    pub negative_slope: f32,
}

/// Configuration for `BinaryOperation` layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BinaryOperationParam {
    #[serde(default)]
    pub operation: BinaryOperation,
}

/// Configuration for `Eltwise` layers.
///
/// `coefficients` applies to `Sum` only; when present it must carry one
/// coefficient per input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EltwiseParam {
    #[serde(default)]
    pub operation: EltwiseOperation,
    #[serde(default)]
    pub coefficients: Vec<f32>,
}

/// Configuration for `InnerProduct` (fully connected) layers.
///
/// The first weight tensor is `[outputs, inputs]`; with `bias_term` a second
/// weight tensor `[outputs]` follows. Dimensions from `axis` onward are
/// flattened into the input features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerProductParam {
    #[serde(default)]
    pub outputs: usize,
    #[serde(default = "default_true")]
    pub bias_term: bool,
    #[serde(default = "default_axis")]
    pub axis: usize,
}

impl Default for InnerProductParam {
    fn default() -> Self {
        Self {
            outputs: 0,
            bias_term: true,
            axis: default_axis(),
        }
    }
}

/// Configuration for `Scale` layers: per-channel multiply with an optional
/// per-channel bias, channels taken from `axis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleParam {
    #[serde(default)]
    pub bias_term: bool,
    #[serde(default = "default_axis")]
    pub axis: usize,
}

impl Default for ScaleParam {
    fn default() -> Self {
        Self {
            bias_term: false,
            axis: default_axis(),
        }
    }
}

/// Configuration for `Softmax` layers: normalization runs along `axis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftmaxParam {
    #[serde(default = "default_axis")]
    pub axis: usize,
}

impl Default for SoftmaxParam {
    fn default() -> Self {
        Self {
            axis: default_axis(),
        }
    }
}

/// Configuration for `Concat` layers: inputs are joined along `axis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatParam {
    #[serde(default = "default_axis")]
    pub axis: usize,
}

impl Default for ConcatParam {
    fn default() -> Self {
        Self {
            axis: default_axis(),
        }
    }
}

fn default_axis() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// One layer record: operator kind, tensor wiring, weight shapes, and the
/// kind-specific configuration section.
///
/// Every configuration section is present with defaults so a layer only
/// spells out what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParam {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub name: String,
    #[serde(default)]
    pub src: Vec<String>,
    #[serde(default)]
    pub dst: Vec<String>,
    #[serde(default)]
    pub weight: Vec<WeightParam>,
    #[serde(default)]
    pub input: InputParam,
    #[serde(default)]
    pub sigmoid: SigmoidParam,
    #[serde(default)]
    pub relu: ReluParam,
    #[serde(default)]
    pub binary_operation: BinaryOperationParam,
    #[serde(default)]
    pub eltwise: EltwiseParam,
    #[serde(default)]
    pub inner_product: InnerProductParam,
    #[serde(default)]
    pub scale: ScaleParam,
    #[serde(default)]
    pub softmax: SoftmaxParam,
    #[serde(default)]
    pub concat: ConcatParam,
}

impl LayerParam {
    /// Creates a layer record with the given kind and name and all-default
    /// configuration. Wiring and config fields are filled in by the caller.
    pub fn new(kind: LayerKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            src: Vec::new(),
            dst: Vec::new(),
            weight: Vec::new(),
            input: InputParam::default(),
            sigmoid: SigmoidParam::default(),
            relu: ReluParam::default(),
            binary_operation: BinaryOperationParam::default(),
            eltwise: EltwiseParam::default(),
            inner_product: InnerProductParam::default(),
            scale: ScaleParam::default(),
            softmax: SoftmaxParam::default(),
            concat: ConcatParam::default(),
        }
    }
}

/// The complete network description: a name, the author's intended output
/// list, and the ordered layer records.
///
/// `dst` is informational; the builder's own unconsumed-output detection is
/// authoritative for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParam {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dst: Vec<String>,
    pub layers: Vec<LayerParam>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_description() {
        let json = r#"{
            "name": "tiny",
            "layers": [
                {"type": "Input", "name": "in", "dst": ["x"]},
                {"type": "Sigmoid", "name": "sig", "src": ["x"], "dst": ["y"]}
            ]
        }"#;

        let param: NetworkParam = serde_json::from_str(json).expect("description should parse");
        assert_eq!(param.name, "tiny");
        assert_eq!(param.layers.len(), 2);
        assert_eq!(param.layers[0].kind, LayerKind::Input);
        assert_eq!(param.layers[1].src, vec!["x".to_string()]);
    }

    #[test]
    fn test_defaults_applied() {
        let json = r#"{"type": "Sigmoid", "name": "s"}"#;
        let layer: LayerParam = serde_json::from_str(json).expect("layer should parse");
        assert!((layer.sigmoid.slope - 1.0).abs() < 1e-6);
        assert_eq!(layer.softmax.axis, 1);
        assert!(layer.inner_product.bias_term);
        assert!(!layer.scale.bias_term);
        assert_eq!(layer.eltwise.operation, EltwiseOperation::Sum);
        assert_eq!(layer.binary_operation.operation, BinaryOperation::Div);
    }

    #[test]
    fn test_unknown_layer_type_fails() {
        let json = r#"{"type": "Quantize", "name": "q"}"#;
        let result: Result<LayerParam, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_weight_shape_descriptors() {
        let json = r#"{
            "type": "InnerProduct",
            "name": "fc",
            "src": ["x"],
            "dst": ["y"],
            "weight": [{"dim": [2, 3]}, {"dim": [2]}],
            "inner_product": {"outputs": 2}
        }"#;
        let layer: LayerParam = serde_json::from_str(json).expect("layer should parse");
        assert_eq!(layer.weight.len(), 2);
        assert_eq!(layer.weight[0].dim, vec![2, 3]);
        assert_eq!(layer.inner_product.outputs, 2);
    }

    #[test]
    fn test_description_round_trip() {
        let mut layer = LayerParam::new(LayerKind::Eltwise, "sum");
        layer.src = vec!["a".to_string(), "b".to_string()];
        layer.dst = vec!["c".to_string()];
        layer.eltwise.coefficients = vec![0.5, 0.5];

        let json = serde_json::to_string(&layer).expect("serialize should succeed");
        let back: LayerParam = serde_json::from_str(&json).expect("round trip should parse");
        assert_eq!(back, layer);
    }
}
