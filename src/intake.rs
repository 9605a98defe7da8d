//! Reads alert messages from a byte stream into the inbound channel.

use crate::core::Message;
use anyhow::Result;
use async_channel::Sender;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Parses newline-delimited JSON messages and forwards them to the engine.
pub struct MessageReader<R> {
    reader: R,
    messages_tx: Sender<Message>,
}

impl<R: AsyncBufRead + Unpin> MessageReader<R> {
    pub fn new(reader: R, messages_tx: Sender<Message>) -> Self {
        Self {
            reader,
            messages_tx,
        }
    }

    /// Forwards messages until end of input.
    ///
    /// Blank lines are skipped and malformed lines are logged and skipped.
    /// Dropping the reader at the end closes this producer's side of the
    /// channel.
    ///
    /// # Returns
    /// * `Ok(n)` with the number of forwarded messages
    /// * `Err` on a read error or if the engine's channel is closed
    pub async fn run(self) -> Result<usize> {
        let mut lines = self.reader.lines();
        let mut forwarded = 0;
        let mut line_no = 0;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<Message>(line) {
                Ok(message) => {
                    debug!(line_no, source = %message.source, "Parsed alert message");
                    self.messages_tx
                        .send(message)
                        .await
                        .map_err(|e| anyhow::anyhow!("Inbound message channel closed: {}", e))?;
                    forwarded += 1;
                }
                Err(e) => {
                    warn!(line_no, error = %e, "Skipping malformed alert message");
                }
            }
        }

        info!(forwarded, "End of message input.");
        Ok(forwarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_reader_skips_malformed_and_blank_lines() {
        let input = concat!(
            r#"{"type":"critical","keys":["svc-a"],"source":"checker1","contents":{"host":"h1"}}"#,
            "\n\n",
            "not json\n",
            r#"{"type":"resolve","keys":["svc-a"],"source":"checker1","contents":{}}"#,
            "\n",
        );
        let (tx, rx) = async_channel::unbounded();
        let reader = MessageReader::new(BufReader::new(input.as_bytes()), tx);

        let forwarded = reader.run().await.unwrap();

        assert_eq!(forwarded, 2);
        assert_eq!(rx.recv().await.unwrap().kind, "critical");
        assert_eq!(rx.recv().await.unwrap().kind, "resolve");
        assert!(rx.recv().await.is_err(), "channel should close once the reader is done");
    }

    #[tokio::test]
    async fn test_reader_forwards_incomplete_messages_for_validation() {
        let input = concat!(
            r#"{"keys":["svc-a"],"source":"checker1","contents":{}}"#,
            "\n",
            r#"{"type":"critical","keys":null,"source":"checker1","contents":{}}"#,
            "\n",
        );
        let (tx, rx) = async_channel::unbounded();
        let reader = MessageReader::new(BufReader::new(input.as_bytes()), tx);

        assert_eq!(reader.run().await.unwrap(), 2);

        let missing_type = rx.recv().await.unwrap();
        assert_eq!(missing_type.kind, "");
        assert_eq!(missing_type.keys, vec!["svc-a".to_string()]);
        let null_keys = rx.recv().await.unwrap();
        assert_eq!(null_keys.kind, "critical");
        assert!(null_keys.keys.is_empty());
    }

    #[tokio::test]
    async fn test_reader_fails_when_engine_is_gone() {
        let (tx, rx) = async_channel::unbounded();
        drop(rx);
        let input = r#"{"type":"warning","keys":["k"],"source":"s","contents":{}}"#;
        let reader = MessageReader::new(BufReader::new(input.as_bytes()), tx);
        assert!(reader.run().await.is_err());
    }
}
