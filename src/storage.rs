use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use tokio::sync::Mutex;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Kind of context file attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Text,
    Image,
}

/// A context file sent alongside a prompt
///
/// Image content is a `data:<mime>;base64,...` URL, text content is the file body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub content: String,
    pub name: String,
}

impl Attachment {
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Text,
            content: content.into(),
            name: name.into(),
        }
    }

    pub fn image(name: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            content: data_url.into(),
            name: name.into(),
        }
    }
}

/// A chat message as persisted in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachments: Vec::new(),
        }
    }
}

/// A message together with its store-assigned identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: u64,
    #[serde(flatten)]
    pub message: Message,
}

/// Internal message record for SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageRecord {
    seq: i64,
    role: Role,
    content: String,
    attachments: Vec<Attachment>,
}

impl MessageRecord {
    fn into_stored(self) -> Result<StoredMessage> {
        let id = u64::try_from(self.seq)
            .map_err(|_| color_eyre::eyre::eyre!("Invalid message id {}", self.seq))?;
        Ok(StoredMessage {
            id,
            message: Message {
                role: self.role,
                content: self.content,
                attachments: self.attachments,
            },
        })
    }
}

/// Last identifier handed out, kept so ids survive bulk clears and restarts
#[derive(Debug, Deserialize)]
struct SequenceRecord {
    last_id: i64,
}

/// Append-only chat history backed by SurrealDB
#[derive(Clone)]
pub struct HistoryStore {
    db: Surreal<Db>,
    last_id: Arc<Mutex<i64>>,
}

impl HistoryStore {
    /// Opens (or creates) the on-disk history database
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Surreal::new::<RocksDb>(path.to_path_buf()).await?;
        Self::init(db).await
    }

    /// Opens a throwaway history that lives only as long as the process
    pub async fn in_memory() -> Result<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        Self::init(db).await
    }

    async fn init(db: Surreal<Db>) -> Result<Self> {
        db.use_ns("lmchat").use_db("history").await?;
        db.query(
            "
            DEFINE TABLE IF NOT EXISTS message SCHEMALESS;
            DEFINE INDEX IF NOT EXISTS idx_message_seq ON message FIELDS seq UNIQUE;
            DEFINE TABLE IF NOT EXISTS meta SCHEMALESS;
        ",
        )
        .await?
        .check()?;

        let sequence: Option<SequenceRecord> = db.select(("meta", "history")).await?;
        let last_id = sequence.map_or(0, |record| record.last_id);
        tracing::debug!(last_id, "history store ready");

        Ok(Self {
            db,
            last_id: Arc::new(Mutex::new(last_id)),
        })
    }

    /// Appends one message and returns it with its assigned identifier
    pub async fn append(&self, message: Message) -> Result<StoredMessage> {
        let mut last_id = self.last_id.lock().await;
        let seq = last_id
            .checked_add(1)
            .ok_or_else(|| color_eyre::eyre::eyre!("Message id space exhausted"))?;

        let record = MessageRecord {
            seq,
            role: message.role,
            content: message.content.clone(),
            attachments: message.attachments.clone(),
        };

        self.db
            .query(
                "
                BEGIN TRANSACTION;
                UPSERT meta:history SET last_id = $seq;
                CREATE type::thing('message', $seq) CONTENT $record;
                COMMIT TRANSACTION;
            ",
            )
            .bind(("seq", seq))
            .bind(("record", record))
            .await?
            .check()?;

        *last_id = seq;
        let id = u64::try_from(seq)
            .map_err(|_| color_eyre::eyre::eyre!("Invalid message id {}", seq))?;
        Ok(StoredMessage { id, message })
    }

    /// Returns every message in insertion order
    pub async fn all(&self) -> Result<Vec<StoredMessage>> {
        let mut response = self
            .db
            .query("SELECT seq, role, content, attachments FROM message ORDER BY seq ASC")
            .await?;
        let records: Vec<MessageRecord> = response.take(0)?;
        records
            .into_iter()
            .map(MessageRecord::into_stored)
            .collect()
    }

    /// Deletes every message in one statement
    pub async fn clear(&self) -> Result<()> {
        // Holding the counter lock keeps a concurrent append from landing mid-clear.
        let _guard = self.last_id.lock().await;
        self.db.query("DELETE FROM message").await?.check()?;
        Ok(())
    }

    /// Writes the whole history as a JSON array into `dir`
    pub async fn export(&self, dir: &Path) -> Result<PathBuf> {
        let messages = self.all().await?;
        std::fs::create_dir_all(dir)?;
        let stamp = chrono::Utc::now().timestamp_millis();
        let path = dir.join(export_file_name(stamp));
        std::fs::write(&path, serde_json::to_string_pretty(&messages)?)?;
        tracing::info!(path = %path.display(), count = messages.len(), "history exported");
        Ok(path)
    }

    /// Takes the id the next append would use, so that append fails
    #[cfg(test)]
    pub(crate) async fn occupy_next_id(&self) -> Result<()> {
        let next = *self.last_id.lock().await + 1;
        self.db
            .query("CREATE type::thing('message', $seq) SET seq = $seq")
            .bind(("seq", next))
            .await?
            .check()?;
        Ok(())
    }
}

#[must_use]
pub fn export_file_name(timestamp_millis: i64) -> String {
    format!("lmstudio-chat-{timestamp_millis}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user_message() -> Message {
        Message::user(
            "Explain this",
            vec![
                Attachment::text("notes.txt", "line one\nline two"),
                Attachment::image("cat.png", "data:image/png;base64,iVBORw0KGgo="),
            ],
        )
    }

    #[tokio::test]
    async fn append_then_all_returns_message_with_id() {
        let store = HistoryStore::in_memory().await.unwrap();
        let message = sample_user_message();

        let stored = store.append(message.clone()).await.unwrap();
        let all = store.all().await.unwrap();

        let last = all.last().unwrap();
        assert_eq!(last.message, message);
        assert_eq!(last.id, stored.id);
    }

    #[tokio::test]
    async fn identifiers_increase_in_insertion_order() {
        let store = HistoryStore::in_memory().await.unwrap();
        let first = store.append(Message::user("one", Vec::new())).await.unwrap();
        let second = store.append(Message::assistant("two")).await.unwrap();
        let third = store.append(Message::user("three", Vec::new())).await.unwrap();
        assert!(first.id < second.id && second.id < third.id);

        let contents: Vec<String> = store
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|stored| stored.message.content)
            .collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = HistoryStore::in_memory().await.unwrap();
        store.append(Message::user("hello", Vec::new())).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
        store.clear().await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn identifiers_are_not_reused_after_clear() {
        let store = HistoryStore::in_memory().await.unwrap();
        let before = store.append(Message::user("a", Vec::new())).await.unwrap();
        store.clear().await.unwrap();
        let after = store.append(Message::user("b", Vec::new())).await.unwrap();
        assert!(after.id > before.id);
    }

    #[tokio::test]
    async fn export_writes_json_array() {
        let store = HistoryStore::in_memory().await.unwrap();
        store.append(sample_user_message()).await.unwrap();
        store.append(Message::assistant("Sure")).await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = store.export(dir.path()).await.unwrap();

        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("lmstudio-chat-"));
        assert!(file_name.ends_with(".json"));
        let raw = std::fs::read_to_string(&path).unwrap();
        let exported: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entries = exported.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["role"], "user");
        assert_eq!(entries[0]["attachments"][1]["type"], "image");
        assert_eq!(entries[1]["content"], "Sure");
        assert!(entries[1].get("attachments").is_none());
    }

    #[test]
    fn stored_message_json_shape() {
        let stored = StoredMessage {
            id: 7,
            message: Message::user("hi", vec![Attachment::text("a.md", "# A")]),
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "role": "user",
                "content": "hi",
                "attachments": [{"type": "text", "content": "# A", "name": "a.md"}]
            })
        );
    }
}
