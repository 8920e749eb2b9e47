//! Server-sent events framing for streamable HTTP response bodies

/// Split a `text/event-stream` body into the data payload of each event
///
/// Only `data:` lines are read. A blank line ends an event; comments and
/// other fields are skipped.
pub fn decode_sse_events(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in body.split('\n') {
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            if !data_lines.is_empty() {
                out.push(data_lines.join("\n"));
                data_lines.clear();
            }
            continue;
        }

        if line.starts_with(':') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    if !data_lines.is_empty() {
        out.push(data_lines.join("\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_single_event() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\"}\n\n";
        assert_eq!(decode_sse_events(body), vec!["{\"jsonrpc\":\"2.0\"}"]);
    }

    #[test]
    fn test_decodes_several_events_in_order() {
        let body = "data: {\"a\":1}\r\n\r\n: keep-alive\n\nid: 7\ndata: {\"b\":2}\n";
        assert_eq!(decode_sse_events(body), vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_joins_multiline_data() {
        assert_eq!(decode_sse_events("data: a\ndata: b\n\n"), vec!["a\nb"]);
    }

    #[test]
    fn test_empty_body_has_no_events() {
        assert!(decode_sse_events("").is_empty());
    }

    #[test]
    fn test_only_one_leading_space_is_stripped() {
        assert_eq!(decode_sse_events("data:  x
data:y

"), vec![" x
y"]);
    }
}
