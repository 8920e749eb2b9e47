//! Calculator operation table
//!
//! Each operation is a static entry: handler, parameter spec and annotation
//! spec. The table is built once at start-up and is the only source for
//! both `tools/list` and `tools/call`, so the published schemas can be
//! tested without a transport.

use audit_mcp::{InputSchema, McpTool, PropertySchema, ToolAnnotations};
use serde_json::{Map, Value};

use crate::error::CalcError;

/// Parameter type accepted by an operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Number,
    Boolean { default: bool },
}

/// One declared parameter
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

impl ParamSpec {
    const fn number(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Number,
            description,
            required: true,
        }
    }

    const fn safety_flag() -> Self {
        Self {
            name: "is_safe",
            kind: ParamKind::Boolean { default: true },
            description: "Set to false to refuse running the operation",
            required: false,
        }
    }

    fn schema(&self) -> PropertySchema {
        match self.kind {
            ParamKind::Number => PropertySchema::number(self.description),
            ParamKind::Boolean { default } => {
                PropertySchema::boolean(self.description).with_default(default)
            }
        }
    }
}

/// Behaviour hints published with an operation
#[derive(Debug, Clone, Copy)]
pub struct AnnotationSpec {
    pub title: &'static str,
    pub read_only: bool,
    pub destructive: bool,
    pub idempotent: bool,
    pub open_world: bool,
}

impl AnnotationSpec {
    const fn pure(title: &'static str) -> Self {
        Self {
            title,
            read_only: true,
            destructive: false,
            idempotent: true,
            open_world: false,
        }
    }

    fn to_annotations(self) -> ToolAnnotations {
        ToolAnnotations {
            title: Some(self.title.to_string()),
            read_only_hint: Some(self.read_only),
            destructive_hint: Some(self.destructive),
            idempotent_hint: Some(self.idempotent),
            open_world_hint: Some(self.open_world),
        }
    }
}

pub type Handler = fn(&Arguments<'_>) -> Result<f64, CalcError>;

/// A registered operation
pub struct OperationSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub annotations: AnnotationSpec,
    pub handler: Handler,
}

impl OperationSpec {
    /// Tool descriptor as published by `tools/list`
    pub fn descriptor(&self) -> McpTool {
        let schema = self
            .params
            .iter()
            .fold(InputSchema::object(), |schema, param| {
                schema.with_property(param.name, param.schema(), param.required)
            });

        McpTool {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            input_schema: Some(schema),
            annotations: Some(self.annotations.to_annotations()),
        }
    }

    /// Validate `arguments` against the declared parameters and run the handler
    pub fn invoke(&self, arguments: &Value) -> Result<f64, CalcError> {
        let empty = Map::new();
        let map = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(CalcError::invalid("arguments", "expected an object")),
        };
        let args = Arguments { map };

        for param in self.params.iter().filter(|p| p.required) {
            if !map.contains_key(param.name) {
                return Err(CalcError::invalid(param.name, "required parameter missing"));
            }
        }

        let value = (self.handler)(&args)?;
        if !value.is_finite() {
            return Err(CalcError::NonFinite(self.name));
        }
        Ok(value)
    }
}

/// Typed view over a call's argument object
#[derive(Debug)]
pub struct Arguments<'a> {
    map: &'a Map<String, Value>,
}

impl Arguments<'_> {
    pub fn number(&self, name: &str) -> Result<f64, CalcError> {
        match self.map.get(name) {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| CalcError::invalid(name, "expected a number")),
            None => Err(CalcError::invalid(name, "required parameter missing")),
        }
    }

    pub fn flag(&self, name: &str, default: bool) -> Result<bool, CalcError> {
        match self.map.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| CalcError::invalid(name, "expected a boolean")),
        }
    }
}

fn require_safe(args: &Arguments<'_>, operation: &'static str) -> Result<(), CalcError> {
    if args.flag("is_safe", true)? {
        Ok(())
    } else {
        Err(CalcError::UnsafeCallRefused(operation))
    }
}

const BINARY_GUARDED: &[ParamSpec] = &[
    ParamSpec::number("a", "First number"),
    ParamSpec::number("b", "Second number"),
    ParamSpec::safety_flag(),
];

pub static ADD: OperationSpec = OperationSpec {
    name: "add",
    description: "Add two numbers together",
    params: BINARY_GUARDED,
    annotations: AnnotationSpec::pure("Addition"),
    handler: |args| {
        require_safe(args, "add")?;
        Ok(args.number("a")? + args.number("b")?)
    },
};

pub static SUBTRACT: OperationSpec = OperationSpec {
    name: "subtract",
    description: "Subtract the second number from the first",
    params: BINARY_GUARDED,
    annotations: AnnotationSpec::pure("Subtraction"),
    handler: |args| {
        require_safe(args, "subtract")?;
        Ok(args.number("a")? - args.number("b")?)
    },
};

pub static MULTIPLY: OperationSpec = OperationSpec {
    name: "multiply",
    description: "Multiply two numbers",
    params: BINARY_GUARDED,
    annotations: AnnotationSpec::pure("Multiplication"),
    handler: |args| {
        require_safe(args, "multiply")?;
        Ok(args.number("a")? * args.number("b")?)
    },
};

pub static DIVIDE: OperationSpec = OperationSpec {
    name: "divide",
    description: "Divide the first number by the second",
    params: &[
        ParamSpec::number("a", "Dividend"),
        ParamSpec::number("b", "Divisor, must not be zero"),
    ],
    annotations: AnnotationSpec::pure("Division"),
    handler: |args| {
        let divisor = args.number("b")?;
        if divisor == 0.0 {
            return Err(CalcError::DivisionByZero);
        }
        Ok(args.number("a")? / divisor)
    },
};

pub static POWER: OperationSpec = OperationSpec {
    name: "power",
    description: "Raise a base to an exponent",
    params: &[
        ParamSpec::number("base", "Base"),
        ParamSpec::number("exponent", "Exponent"),
    ],
    annotations: AnnotationSpec::pure("Exponentiation"),
    handler: |args| Ok(args.number("base")?.powf(args.number("exponent")?)),
};

pub static SQUARE_ROOT: OperationSpec = OperationSpec {
    name: "square_root",
    description: "Square root of a non-negative number",
    params: &[ParamSpec::number("x", "Number to take the square root of")],
    annotations: AnnotationSpec::pure("Square root"),
    handler: |args| {
        let x = args.number("x")?;
        if x < 0.0 {
            return Err(CalcError::NegativeSquareRoot(x));
        }
        Ok(x.sqrt())
    },
};

impl std::fmt::Debug for OperationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

/// Operations published by a server instance, in listing order
#[derive(Debug, Clone)]
pub struct OperationTable {
    operations: Vec<&'static OperationSpec>,
}

impl OperationTable {
    /// All six calculator operations
    pub fn arithmetic() -> Self {
        Self::from_specs([&ADD, &SUBTRACT, &MULTIPLY, &DIVIDE, &POWER, &SQUARE_ROOT])
    }

    /// A table over the given operations; later duplicates are ignored
    pub fn from_specs(specs: impl IntoIterator<Item = &'static OperationSpec>) -> Self {
        let mut operations: Vec<&'static OperationSpec> = Vec::new();
        for spec in specs {
            if !operations.iter().any(|op| op.name == spec.name) {
                operations.push(spec);
            }
        }
        Self { operations }
    }

    pub fn get(&self, name: &str) -> Option<&'static OperationSpec> {
        self.operations.iter().copied().find(|op| op.name == name)
    }

    /// Descriptors for `tools/list`
    pub fn descriptors(&self) -> Vec<McpTool> {
        self.operations.iter().map(|op| op.descriptor()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operations.iter().map(|op| op.name).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Default for OperationTable {
    fn default() -> Self {
        Self::arithmetic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Value) -> Result<f64, CalcError> {
        OperationTable::arithmetic().get(name).unwrap().invoke(&args)
    }

    #[test]
    fn test_divide() {
        assert_eq!(call("divide", json!({"a": 20, "b": 5})), Ok(4.0));
        assert_eq!(
            call("divide", json!({"a": 10, "b": 0})),
            Err(CalcError::DivisionByZero)
        );
    }

    #[test]
    fn test_square_root() {
        assert_eq!(call("square_root", json!({"x": 16})), Ok(4.0));
        assert_eq!(
            call("square_root", json!({"x": -1})),
            Err(CalcError::NegativeSquareRoot(-1.0))
        );
    }

    #[test]
    fn test_safety_flag_guards_add() {
        assert_eq!(call("add", json!({"a": 5, "b": 3})), Ok(8.0));
        assert_eq!(call("add", json!({"a": 5, "b": 3, "is_safe": true})), Ok(8.0));
        assert_eq!(
            call("add", json!({"a": 5, "b": 3, "is_safe": false})),
            Err(CalcError::UnsafeCallRefused("add"))
        );
    }

    #[test]
    fn test_other_guarded_operations() {
        assert_eq!(call("subtract", json!({"a": 5, "b": 3})), Ok(2.0));
        assert_eq!(call("multiply", json!({"a": 2.5, "b": 4})), Ok(10.0));
        assert!(call("multiply", json!({"a": 1, "b": 1, "is_safe": false})).is_err());
    }

    #[test]
    fn test_power_and_non_finite_results() {
        assert_eq!(call("power", json!({"base": 2, "exponent": 10})), Ok(1024.0));
        assert_eq!(
            call("power", json!({"base": 0, "exponent": -1})),
            Err(CalcError::NonFinite("power"))
        );
    }

    #[test]
    fn test_invalid_arguments_are_domain_errors() {
        assert!(matches!(
            call("add", json!({"a": 1})),
            Err(CalcError::InvalidArgument { .. })
        ));
        assert!(matches!(
            call("add", json!({"a": "1", "b": 2})),
            Err(CalcError::InvalidArgument { .. })
        ));
        assert!(matches!(
            call("add", json!({"a": 1, "b": 2, "is_safe": "no"})),
            Err(CalcError::InvalidArgument { .. })
        ));
        assert!(matches!(
            call("square_root", json!([16])),
            Err(CalcError::InvalidArgument { .. })
        ));
        assert!(matches!(
            call("square_root", Value::Null),
            Err(CalcError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_descriptors_publish_schema_and_annotations() {
        let table = OperationTable::arithmetic();
        assert_eq!(
            table.names(),
            vec!["add", "subtract", "multiply", "divide", "power", "square_root"]
        );

        let add = ADD.descriptor();
        let value = serde_json::to_value(&add).unwrap();
        assert_eq!(value["inputSchema"]["type"], "object");
        assert_eq!(value["inputSchema"]["required"], json!(["a", "b"]));
        assert_eq!(value["inputSchema"]["properties"]["is_safe"]["type"], "boolean");
        assert_eq!(value["inputSchema"]["properties"]["is_safe"]["default"], true);
        assert_eq!(value["annotations"]["readOnlyHint"], true);
        assert_eq!(value["annotations"]["destructiveHint"], false);

        let divide = DIVIDE.descriptor();
        assert!(divide.input_schema.unwrap().property("is_safe").is_none());
    }

    #[test]
    fn test_from_specs_keeps_order_and_drops_duplicates() {
        let table = OperationTable::from_specs([&DIVIDE, &ADD, &DIVIDE]);
        assert_eq!(table.names(), vec!["divide", "add"]);
        assert!(table.get("power").is_none());
    }
}
