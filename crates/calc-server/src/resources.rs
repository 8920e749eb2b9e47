//! Static help resources

use audit_mcp::protocol::ResourceContents;
use audit_mcp::McpResource;

/// A fixed text resource
#[derive(Debug, Clone, Copy)]
pub struct StaticResource {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub text: &'static str,
}

const MIME_TEXT: &str = "text/plain";

pub const RESOURCES: &[StaticResource] = &[
    StaticResource {
        uri: "calc://help",
        name: "help",
        description: "How to call the calculator tools",
        text: "Call a tool with numeric arguments, e.g. add {\"a\": 5, \"b\": 3}.\n\
               add, subtract and multiply accept an optional boolean is_safe \
               (default true); passing false refuses the call.\n\
               Domain errors (division by zero, negative square root) come back \
               as tool results with isError set.",
    },
    StaticResource {
        uri: "calc://operations",
        name: "operations",
        description: "List of supported operations",
        text: "add(a, b, is_safe)\n\
               subtract(a, b, is_safe)\n\
               multiply(a, b, is_safe)\n\
               divide(a, b)\n\
               power(base, exponent)\n\
               square_root(x)",
    },
];

impl StaticResource {
    pub fn descriptor(&self) -> McpResource {
        McpResource {
            uri: self.uri.to_string(),
            name: Some(self.name.to_string()),
            description: Some(self.description.to_string()),
            mime_type: Some(MIME_TEXT.to_string()),
        }
    }

    pub fn contents(&self) -> ResourceContents {
        ResourceContents {
            uri: self.uri.to_string(),
            mime_type: Some(MIME_TEXT.to_string()),
            text: Some(self.text.to_string()),
        }
    }
}

pub fn find(uri: &str) -> Option<&'static StaticResource> {
    RESOURCES.iter().find(|r| r.uri == uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_resources_resolve() {
        assert_eq!(RESOURCES.len(), 2);
        assert!(find("calc://help").unwrap().text.contains("is_safe"));
        assert!(find("calc://operations").unwrap().text.contains("square_root(x)"));
        assert!(find("calc://missing").is_none());
    }

    #[test]
    fn test_descriptor_is_text_plain() {
        let descriptor = RESOURCES[0].descriptor();
        assert_eq!(descriptor.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(descriptor.name.as_deref(), Some("help"));
    }
}
