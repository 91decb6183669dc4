//! Response body framing for relayed chunks.
//!
//! `DataStream` writes the line-oriented `<type>:<json>\n` protocol read by
//! the web chat widget: `f` start step, `0` text, `e` finish step, `d` finish
//! message, `3` error. `Text` writes provider tokens verbatim.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::providers::StreamChunk;

/// Message written in place of upstream error details.
pub const GENERIC_STREAM_ERROR: &str = "An error occurred.";

/// Header announcing the data stream protocol version.
pub const DATA_STREAM_HEADER: (&str, &str) = ("x-vercel-ai-data-stream", "v1");

/// Both formats are sent as plain UTF-8 text.
pub const BODY_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamFormat {
    #[serde(rename = "text")]
    Text,
    #[default]
    #[serde(rename = "data")]
    DataStream,
}

impl StreamFormat {

    /// Extra response header required by the format, if any.
    pub fn protocol_header(self) -> Option<(&'static str, &'static str)> {
        match self {
            StreamFormat::Text => None,
            StreamFormat::DataStream => Some(DATA_STREAM_HEADER),
        }
    }

    /// Opening part written before any chunk.
    pub fn start(self, message_id: &str) -> Option<String> {
        match self {
            StreamFormat::Text => None,
            StreamFormat::DataStream => Some(data_part('f', &json!({ "messageId": message_id }))),
        }
    }

    /// Encode one chunk for the response body. `None` means write nothing.
    pub fn encode(self, chunk: &StreamChunk) -> Option<String> {
        match self {
            StreamFormat::Text => match chunk {
                StreamChunk::Token(text) => Some(text.clone()),
                StreamChunk::Done { .. } | StreamChunk::Error(_) => None,
            },
            StreamFormat::DataStream => Some(match chunk {
                StreamChunk::Token(text) => data_part('0', &json!(text)),
                StreamChunk::Done {
                    finish_reason,
                    usage,
                } => {
                    let mut finish = json!({
                        "finishReason": finish_reason.as_deref().unwrap_or("unknown"),
                    });
                    if let Some(usage) = usage {
                        finish["usage"] = json!(usage);
                    }
                    let mut step = finish.clone();
                    step["isContinued"] = json!(false);
                    data_part('e', &step) + &data_part('d', &finish)
                }
                StreamChunk::Error(_) => data_part('3', &json!(GENERIC_STREAM_ERROR)),
            }),
        }
    }
}

fn data_part(code: char, value: &serde_json::Value) -> String {
    format!("{}:{}\n", code, value)
}

impl std::fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamFormat::Text => write!(f, "text"),
            StreamFormat::DataStream => write!(f, "data"),
        }
    }
}

impl FromStr for StreamFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(StreamFormat::Text),
            "data" | "data-stream" => Ok(StreamFormat::DataStream),
            other => Err(format!("Unknown stream format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Usage;

    #[test]
    fn test_text_writes_tokens_only() {
        let fmt = StreamFormat::Text;
        assert_eq!(
            fmt.encode(&StreamChunk::Token("Malaria ".into())).as_deref(),
            Some("Malaria ")
        );
        assert!(fmt
            .encode(&StreamChunk::Done {
                finish_reason: Some("stop".into()),
                usage: None
            })
            .is_none());
        assert!(fmt.encode(&StreamChunk::Error("boom".into())).is_none());
        assert!(fmt.start("msg-1").is_none());
        assert!(fmt.protocol_header().is_none());
    }

    #[test]
    fn test_data_stream_is_default() {
        assert_eq!(StreamFormat::default(), StreamFormat::DataStream);
        assert_eq!(StreamFormat::default().protocol_header(), Some(DATA_STREAM_HEADER));
    }

    #[test]
    fn test_data_stream_start_part() {
        let line = StreamFormat::DataStream.start("msg-42").unwrap();
        assert_eq!(line, "f:{\"messageId\":\"msg-42\"}\n");
    }

    #[test]
    fn test_data_stream_token_is_json_escaped() {
        let line = StreamFormat::DataStream
            .encode(&StreamChunk::Token("say \"hi\"\n".into()))
            .unwrap();
        assert_eq!(line, "0:\"say \\\"hi\\\"\\n\"\n");
    }

    #[test]
    fn test_data_stream_finish_part() {
        let line = StreamFormat::DataStream
            .encode(&StreamChunk::Done {
                finish_reason: Some("stop".into()),
                usage: Some(Usage {
                    prompt_tokens: 12,
                    completion_tokens: 30,
                }),
            })
            .unwrap();
        let lines: Vec<&str> = line.lines().collect();
        assert_eq!(lines.len(), 2);

        let step: serde_json::Value =
            serde_json::from_str(lines[0].strip_prefix("e:").unwrap()).unwrap();
        assert_eq!(step["finishReason"], "stop");
        assert_eq!(step["isContinued"], false);
        assert_eq!(step["usage"]["completionTokens"], 30);

        let payload: serde_json::Value =
            serde_json::from_str(lines[1].strip_prefix("d:").unwrap()).unwrap();
        assert_eq!(payload["finishReason"], "stop");
        assert_eq!(payload["usage"]["promptTokens"], 12);
        assert_eq!(payload["usage"]["completionTokens"], 30);
        assert!(payload.get("isContinued").is_none());
    }

    #[test]
    fn test_finish_without_reason_is_unknown() {
        let line = StreamFormat::DataStream
            .encode(&StreamChunk::Done {
                finish_reason: None,
                usage: None,
            })
            .unwrap();
        assert!(line.ends_with("d:{\"finishReason\":\"unknown\"}\n"));
    }

    #[test]
    fn test_data_stream_error_hides_detail() {
        let line = StreamFormat::DataStream
            .encode(&StreamChunk::Error("invalid api key sk-123".into()))
            .unwrap();
        assert_eq!(line, "3:\"An error occurred.\"\n");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("text".parse::<StreamFormat>(), Ok(StreamFormat::Text));
        assert_eq!(" DATA ".parse::<StreamFormat>(), Ok(StreamFormat::DataStream));
        assert!("sse".parse::<StreamFormat>().is_err());
        assert_eq!(StreamFormat::DataStream.to_string(), "data");
    }
}
