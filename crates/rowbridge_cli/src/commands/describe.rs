//! Describe command implementation.

use crate::Format;
use rowbridge_core::{IndexBase, KindDescriptor, KindTable, Operation};
use serde::Serialize;

/// One host-visible kind.
#[derive(Debug, Serialize)]
pub struct KindInfo {
    /// Kind name.
    pub name: &'static str,
    /// Accepted constructor argument counts, if constructible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor: Option<Vec<usize>>,
    /// Named methods.
    pub methods: Vec<OperationInfo>,
    /// Generic-index operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<OperationInfo>,
    /// Read-only properties.
    pub properties: Vec<&'static str>,
}

/// One operation of a kind.
#[derive(Debug, Serialize)]
pub struct OperationInfo {
    /// Operation name.
    pub name: &'static str,
    /// Argument count.
    pub arity: usize,
    /// Index basing, for column accessors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_base: Option<u8>,
}

impl From<&Operation> for OperationInfo {
    fn from(op: &Operation) -> Self {
        Self {
            name: op.name,
            arity: op.arity,
            index_base: op.index_base.map(|base| match base {
                IndexBase::Zero => 0,
                IndexBase::One => 1,
            }),
        }
    }
}

impl From<&KindDescriptor> for KindInfo {
    fn from(descriptor: &KindDescriptor) -> Self {
        Self {
            name: descriptor.name(),
            constructor: descriptor.constructor.map(<[usize]>::to_vec),
            methods: descriptor.methods.iter().map(OperationInfo::from).collect(),
            index: descriptor.index.as_ref().map(OperationInfo::from),
            properties: descriptor.properties.iter().map(|p| p.name).collect(),
        }
    }
}

/// Registers the kinds in a scratch table and returns them in order.
pub fn collect() -> Result<Vec<KindInfo>, Box<dyn std::error::Error>> {
    let mut table = KindTable::new();
    rowbridge_core::init(&mut table)?;
    Ok(table.iter().map(KindInfo::from).collect())
}

/// Runs the describe command.
pub fn run(format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let kinds = collect()?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&kinds)?),
        Format::Text => print_text_output(&kinds),
    }
    Ok(())
}

fn print_text_output(kinds: &[KindInfo]) {
    for kind in kinds {
        println!("{}", kind.name);
        if let Some(arities) = &kind.constructor {
            let arities: Vec<String> = arities.iter().map(ToString::to_string).collect();
            println!("  constructor: {} argument(s)", arities.join(" or "));
        }
        for method in &kind.methods {
            println!("  {}", describe_operation(method));
        }
        if let Some(index) = &kind.index {
            println!("  [index]: {}", describe_operation(index));
        }
        for property in &kind.properties {
            println!("  .{property} (read-only)");
        }
    }
}

fn describe_operation(op: &OperationInfo) -> String {
    match op.index_base {
        Some(base) => format!("{}/{} ({base}-based)", op.name, op.arity),
        None => format!("{}/{}", op.name, op.arity),
    }
}
