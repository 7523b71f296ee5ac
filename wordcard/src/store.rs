//! SQLite-backed store for generation records.
//!
//! [`GenerationStore`] persists one row per flashcard generation, surviving
//! process restarts. Uses [`rusqlite`] for synchronous access, bridged to
//! async via [`tokio::task::spawn_blocking`].
//!
//! # Storage Model
//!
//! Each generation is a single row in the `generations` table keyed by its
//! identifier. Lifecycle status moves forward only: `initialized` rows may
//! become `completed` or `failed`, terminal rows never change. Timestamps
//! are RFC 3339 with microsecond precision, so lexicographic order matches
//! chronological order and the `(language, age, created_at)` index serves
//! the recent-history read directly.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{PersistError, Result};
use crate::generation::{
    CreativeOutput, GenerationId, GenerationRecord, GenerationStatus, Language, MediaLocations,
    PedagogicalOutput, UserInput,
};
use crate::location::AssetLocation;

/// Default number of sentences returned by the recent-history read.
pub const DEFAULT_HISTORY_LIMIT: usize = 25;

/// SQLite-backed generation record store.
///
/// Cloneable via `Arc<Mutex<Connection>>`, so multiple handles may share a
/// single database. Schema is auto-created on construction and all blocking
/// I/O is offloaded to the tokio blocking thread pool.
#[derive(Debug, Clone)]
pub struct GenerationStore {
    conn: Arc<Mutex<Connection>>,
}

impl GenerationStore {
    /// Opens (or creates) a database at `path` and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Database`] if the file cannot be opened or
    /// the schema cannot be applied.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(PersistError::from)?;
        Self::from_connection(conn)
    }

    /// Opens an ephemeral in-memory database (data lost on drop).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(PersistError::from)?;
        Self::from_connection(conn)
    }

    /// Wraps an existing [`Connection`], applying pragmas and schema setup.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;\
             PRAGMA foreign_keys = ON;\
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(PersistError::from)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS generations (
                id                   TEXT PRIMARY KEY,
                age                  INTEGER,
                language             TEXT NOT NULL,
                theme                TEXT,
                target_word          TEXT,
                sentence             TEXT NOT NULL,
                learning_goal        TEXT NOT NULL,
                tags                 TEXT NOT NULL DEFAULT '[]',
                image_prompt         TEXT,
                style_description    TEXT,
                raw_image_location   TEXT,
                final_image_location TEXT,
                final_audio_location TEXT,
                status               TEXT NOT NULL,
                failure_reason       TEXT,
                created_at           TEXT NOT NULL,
                completed_at         TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_generations_profile
            ON generations (language, age, created_at DESC);",
        )
        .map_err(PersistError::from)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Bridges a synchronous closure onto the tokio blocking thread pool.
    ///
    /// The closure receives a reference to the locked [`Connection`] and
    /// operates in [`PersistError`] space; conversion to [`Result`] happens
    /// at the boundary via the double-`?` pattern.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, PersistError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        Ok(tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|e| PersistError::Lock(e.to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| PersistError::Task(e.to_string()))??)
    }

    /// Creates the initial record for a generation and returns its id.
    ///
    /// A fresh id is minted when `id` is `None`. The record starts in
    /// [`GenerationStatus::Initialized`] with no media attached.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Conflict`] if a record with the same id
    /// already exists.
    pub async fn persist_initial(
        &self,
        id: Option<GenerationId>,
        input: &UserInput,
        pedagogy: &PedagogicalOutput,
    ) -> Result<GenerationId> {
        let id = id.unwrap_or_default();
        let row_id = id.clone();
        let age = input.age;
        let language = input.language.as_code();
        let theme = input.theme.clone();
        let target_word = input.target_word.clone();
        let sentence = pedagogy.sentence.clone();
        let learning_goal = pedagogy.learning_goal.clone();
        let tags = serde_json::to_string(&pedagogy.tags).map_err(PersistError::from)?;
        let created_at = now_rfc3339();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO generations \
                 (id, age, language, theme, target_word, sentence, learning_goal, tags, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row_id.as_str(),
                    age,
                    language,
                    theme,
                    target_word,
                    sentence,
                    learning_goal,
                    tags,
                    GenerationStatus::Initialized.as_str(),
                    created_at,
                ],
            )
            .map_err(|err| match err {
                rusqlite::Error::SqliteFailure(e, _)
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    PersistError::Conflict(format!("generation {row_id} already exists"))
                }
                other => PersistError::from(other),
            })?;
            Ok(())
        })
        .await?;

        Ok(id)
    }

    /// Attaches the creative brief to a still-initialized record.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::NotFound`] if no record exists for `id` and
    /// [`PersistError::Conflict`] if the record already reached a terminal
    /// status.
    pub async fn record_creative(
        &self,
        id: &GenerationId,
        creative: &CreativeOutput,
    ) -> Result<()> {
        let row_id = id.clone();
        let image_prompt = creative.image_prompt.clone();
        let style_description = creative.style_description.clone();

        self.blocking(move |conn| {
            let tx = conn.unchecked_transaction()?;
            let status = fetch_status(&tx, row_id.as_str())?;
            match status {
                GenerationStatus::Initialized => {}
                other => {
                    return Err(PersistError::Conflict(format!(
                        "generation {row_id} is {other}, cannot attach creative brief"
                    )));
                }
            }

            tx.execute(
                "UPDATE generations SET image_prompt = ?2, style_description = ?3 WHERE id = ?1",
                params![row_id.as_str(), image_prompt, style_description],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Records the final media locations and completes the record.
    ///
    /// Re-applying the same locations to an already completed record is a
    /// no-op, so a retried build converges instead of erroring.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::NotFound`] if no record exists for `id` and
    /// [`PersistError::Conflict`] if the record completed with different
    /// locations or was already marked failed.
    pub async fn persist_final(
        &self,
        id: &GenerationId,
        final_image: &AssetLocation,
        final_audio: &AssetLocation,
    ) -> Result<()> {
        let row_id = id.clone();
        let image = final_image.to_string();
        let audio = final_audio.to_string();
        let completed_at = now_rfc3339();

        self.blocking(move |conn| {
            let tx = conn.unchecked_transaction()?;
            let row: Option<(String, Option<String>, Option<String>)> = tx
                .query_row(
                    "SELECT status, final_image_location, final_audio_location \
                     FROM generations WHERE id = ?1",
                    params![row_id.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let Some((status, stored_image, stored_audio)) = row else {
                return Err(PersistError::NotFound(row_id.to_string()));
            };

            match parse_status(&status)? {
                GenerationStatus::Initialized => {
                    tx.execute(
                        "UPDATE generations \
                         SET final_image_location = ?2, final_audio_location = ?3, \
                             status = ?4, completed_at = ?5 \
                         WHERE id = ?1",
                        params![
                            row_id.as_str(),
                            image,
                            audio,
                            GenerationStatus::Completed.as_str(),
                            completed_at,
                        ],
                    )?;
                    tx.commit()?;
                    Ok(())
                }
                GenerationStatus::Completed
                    if stored_image.as_deref() == Some(image.as_str())
                        && stored_audio.as_deref() == Some(audio.as_str()) =>
                {
                    Ok(())
                }
                other => Err(PersistError::Conflict(format!(
                    "generation {row_id} is already {other}"
                ))),
            }
        })
        .await
    }

    /// Marks a record failed with a human-readable reason.
    ///
    /// An already failed record keeps its original reason; re-applying is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::NotFound`] if no record exists for `id` and
    /// [`PersistError::Conflict`] if the record already completed.
    pub async fn mark_failed(&self, id: &GenerationId, reason: &str) -> Result<()> {
        let row_id = id.clone();
        let reason = reason.to_owned();
        let completed_at = now_rfc3339();

        self.blocking(move |conn| {
            let tx = conn.unchecked_transaction()?;
            match fetch_status(&tx, row_id.as_str())? {
                GenerationStatus::Initialized => {
                    tx.execute(
                        "UPDATE generations \
                         SET status = ?2, failure_reason = ?3, completed_at = ?4 \
                         WHERE id = ?1",
                        params![
                            row_id.as_str(),
                            GenerationStatus::Failed.as_str(),
                            reason,
                            completed_at,
                        ],
                    )?;
                    tx.commit()?;
                    Ok(())
                }
                GenerationStatus::Failed => Ok(()),
                GenerationStatus::Completed => Err(PersistError::Conflict(format!(
                    "generation {row_id} already completed"
                ))),
            }
        })
        .await
    }

    /// Loads the full record for `id`, or `None` if it does not exist.
    pub async fn fetch(&self, id: &GenerationId) -> Result<Option<GenerationRecord>> {
        let row_id = id.clone();
        self.blocking(move |conn| {
            let raw: Option<RawRow> = conn
                .query_row(
                    "SELECT id, age, language, theme, target_word, sentence, learning_goal, \
                            tags, image_prompt, style_description, raw_image_location, \
                            final_image_location, final_audio_location, status, \
                            failure_reason, created_at, completed_at \
                     FROM generations WHERE id = ?1",
                    params![row_id.as_str()],
                    |row| {
                        Ok(RawRow {
                            id: row.get(0)?,
                            age: row.get(1)?,
                            language: row.get(2)?,
                            theme: row.get(3)?,
                            target_word: row.get(4)?,
                            sentence: row.get(5)?,
                            learning_goal: row.get(6)?,
                            tags: row.get(7)?,
                            image_prompt: row.get(8)?,
                            style_description: row.get(9)?,
                            raw_image_location: row.get(10)?,
                            final_image_location: row.get(11)?,
                            final_audio_location: row.get(12)?,
                            status: row.get(13)?,
                            failure_reason: row.get(14)?,
                            created_at: row.get(15)?,
                            completed_at: row.get(16)?,
                        })
                    },
                )
                .optional()?;

            match raw {
                Some(row) => Ok(Some(row.into_record()?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Returns the most recent sentences generated for a learner profile,
    /// newest first. Used to steer new content away from repetition.
    pub async fn fetch_recent(
        &self,
        language: Language,
        age: Option<u8>,
        limit: usize,
    ) -> Result<Vec<String>> {
        let code = language.as_code();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT sentence FROM generations \
                 WHERE language = ?1 AND age IS ?2 \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?3",
            )?;

            let sentences = stmt
                .query_map(params![code, age, limit as i64], |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

            Ok(sentences)
        })
        .await
    }
}

/// Column snapshot of one `generations` row before domain conversion.
struct RawRow {
    id: String,
    age: Option<u8>,
    language: String,
    theme: Option<String>,
    target_word: Option<String>,
    sentence: String,
    learning_goal: String,
    tags: String,
    image_prompt: Option<String>,
    style_description: Option<String>,
    raw_image_location: Option<String>,
    final_image_location: Option<String>,
    final_audio_location: Option<String>,
    status: String,
    failure_reason: Option<String>,
    created_at: String,
    completed_at: Option<String>,
}

impl RawRow {
    fn into_record(self) -> std::result::Result<GenerationRecord, PersistError> {
        let tags: Vec<String> = serde_json::from_str(&self.tags)?;
        let creative = self.image_prompt.map(|image_prompt| CreativeOutput {
            image_prompt,
            style_description: self.style_description,
        });
        let media = MediaLocations {
            raw_image: parse_location(self.raw_image_location)?,
            final_image: parse_location(self.final_image_location)?,
            final_audio: parse_location(self.final_audio_location)?,
        };
        let completed_at = match self.completed_at {
            Some(ts) => Some(parse_timestamp(&ts)?),
            None => None,
        };

        Ok(GenerationRecord {
            id: GenerationId::from(self.id),
            user_input: UserInput {
                age: self.age,
                language: Language::from_code(&self.language),
                theme: self.theme,
                target_word: self.target_word,
            },
            pedagogy: PedagogicalOutput {
                sentence: self.sentence,
                learning_goal: self.learning_goal,
                tags,
            },
            creative,
            media,
            status: parse_status(&self.status)?,
            failure_reason: self.failure_reason,
            created_at: parse_timestamp(&self.created_at)?,
            completed_at,
        })
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, PersistError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| PersistError::Database(format!("corrupt timestamp `{value}`: {err}")))
}

fn parse_location(
    value: Option<String>,
) -> std::result::Result<Option<AssetLocation>, PersistError> {
    value
        .map(|v| {
            v.parse::<AssetLocation>()
                .map_err(|err| PersistError::Database(format!("corrupt location: {err}")))
        })
        .transpose()
}

fn parse_status(value: &str) -> std::result::Result<GenerationStatus, PersistError> {
    GenerationStatus::from_str_opt(value)
        .ok_or_else(|| PersistError::Database(format!("unknown status `{value}`")))
}

fn fetch_status(
    conn: &Connection,
    id: &str,
) -> std::result::Result<GenerationStatus, PersistError> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM generations WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    match status {
        Some(s) => parse_status(&s),
        None => Err(PersistError::NotFound(id.to_owned())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn new_store() -> GenerationStore {
        GenerationStore::in_memory().unwrap()
    }

    fn sample_input(language: Language, age: Option<u8>) -> UserInput {
        UserInput {
            age,
            language,
            theme: Some("animals".into()),
            target_word: Some("fox".into()),
        }
    }

    fn sample_pedagogy(sentence: &str) -> PedagogicalOutput {
        PedagogicalOutput {
            sentence: sentence.to_owned(),
            learning_goal: "vocabulary".into(),
            tags: vec!["animals".into(), "nature".into()],
        }
    }

    fn locations() -> (AssetLocation, AssetLocation) {
        let image = "mem://wordcard-media/composed/g1.png"
            .parse::<AssetLocation>()
            .unwrap();
        let audio = "mem://wordcard-media/audio/g1.mp3"
            .parse::<AssetLocation>()
            .unwrap();
        (image, audio)
    }

    fn persist_err(err: Error) -> PersistError {
        match err {
            Error::Persist(inner) => inner,
            other => panic!("expected persist error, got {other}"),
        }
    }

    mod intake {
        use super::*;

        #[tokio::test]
        async fn initial_record_round_trips() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::Fr, Some(4)),
                    &sample_pedagogy("Le renard dort."),
                )
                .await
                .unwrap();

            let record = store.fetch(&id).await.unwrap().unwrap();
            assert_eq!(record.id, id);
            assert_eq!(record.user_input.language, Language::Fr);
            assert_eq!(record.user_input.age, Some(4));
            assert_eq!(record.pedagogy.sentence, "Le renard dort.");
            assert_eq!(record.pedagogy.tags, vec!["animals", "nature"]);
            assert_eq!(record.status, GenerationStatus::Initialized);
            assert!(record.creative.is_none());
            assert!(record.media.final_image.is_none());
            assert!(record.completed_at.is_none());
        }

        #[tokio::test]
        async fn explicit_id_is_honored() {
            let store = new_store();
            let id = store
                .persist_initial(
                    Some(GenerationId::from("g-explicit")),
                    &sample_input(Language::En, None),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();
            assert_eq!(id.as_str(), "g-explicit");
            assert!(store.fetch(&id).await.unwrap().is_some());
        }

        #[tokio::test]
        async fn duplicate_id_is_a_conflict() {
            let store = new_store();
            let id = GenerationId::from("g-dup");
            let input = sample_input(Language::En, None);
            let pedagogy = sample_pedagogy("The fox sleeps.");
            store
                .persist_initial(Some(id.clone()), &input, &pedagogy)
                .await
                .unwrap();

            let err = store
                .persist_initial(Some(id), &input, &pedagogy)
                .await
                .unwrap_err();
            assert!(matches!(persist_err(err), PersistError::Conflict(_)));
        }

        #[tokio::test]
        async fn fetch_of_unknown_id_is_none() {
            let store = new_store();
            let missing = store.fetch(&GenerationId::from("nope")).await.unwrap();
            assert!(missing.is_none());
        }
    }

    mod creative {
        use super::*;

        #[tokio::test]
        async fn brief_is_attached_to_initialized_record() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::En, Some(5)),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();

            let brief = CreativeOutput {
                image_prompt: "a sleeping fox in a watercolor forest".into(),
                style_description: Some("soft watercolor".into()),
            };
            store.record_creative(&id, &brief).await.unwrap();

            let record = store.fetch(&id).await.unwrap().unwrap();
            assert_eq!(record.creative, Some(brief));
        }

        #[tokio::test]
        async fn missing_record_is_not_found() {
            let store = new_store();
            let err = store
                .record_creative(&GenerationId::from("nope"), &CreativeOutput::default())
                .await
                .unwrap_err();
            assert!(matches!(persist_err(err), PersistError::NotFound(_)));
        }

        #[tokio::test]
        async fn terminal_record_rejects_the_brief() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::En, None),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();
            store.mark_failed(&id, "image model down").await.unwrap();

            let err = store
                .record_creative(&id, &CreativeOutput::default())
                .await
                .unwrap_err();
            assert!(matches!(persist_err(err), PersistError::Conflict(_)));
        }
    }

    mod finalize {
        use super::*;

        #[tokio::test]
        async fn completes_an_initialized_record() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::Es, Some(6)),
                    &sample_pedagogy("El zorro duerme."),
                )
                .await
                .unwrap();
            let (image, audio) = locations();

            store.persist_final(&id, &image, &audio).await.unwrap();

            let record = store.fetch(&id).await.unwrap().unwrap();
            assert_eq!(record.status, GenerationStatus::Completed);
            assert_eq!(record.media.final_image, Some(image));
            assert_eq!(record.media.final_audio, Some(audio));
            assert!(record.completed_at.is_some());
            assert!(record.failure_reason.is_none());
        }

        #[tokio::test]
        async fn reapplying_identical_locations_is_a_no_op() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::En, None),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();
            let (image, audio) = locations();

            store.persist_final(&id, &image, &audio).await.unwrap();
            store.persist_final(&id, &image, &audio).await.unwrap();

            let record = store.fetch(&id).await.unwrap().unwrap();
            assert_eq!(record.status, GenerationStatus::Completed);
        }

        #[tokio::test]
        async fn different_locations_for_a_completed_record_conflict() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::En, None),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();
            let (image, audio) = locations();
            store.persist_final(&id, &image, &audio).await.unwrap();

            let other = "mem://wordcard-media/composed/other.png"
                .parse::<AssetLocation>()
                .unwrap();
            let err = store.persist_final(&id, &other, &audio).await.unwrap_err();
            assert!(matches!(persist_err(err), PersistError::Conflict(_)));
        }

        #[tokio::test]
        async fn missing_record_is_not_found() {
            let store = new_store();
            let (image, audio) = locations();
            let err = store
                .persist_final(&GenerationId::from("nope"), &image, &audio)
                .await
                .unwrap_err();
            assert!(matches!(persist_err(err), PersistError::NotFound(_)));
        }

        #[tokio::test]
        async fn failed_record_cannot_complete() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::En, None),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();
            store.mark_failed(&id, "speech synthesis failed").await.unwrap();

            let (image, audio) = locations();
            let err = store.persist_final(&id, &image, &audio).await.unwrap_err();
            assert!(matches!(persist_err(err), PersistError::Conflict(_)));
        }
    }

    mod failure {
        use super::*;

        #[tokio::test]
        async fn marks_an_initialized_record_failed() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::En, None),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();

            store.mark_failed(&id, "image model down").await.unwrap();

            let record = store.fetch(&id).await.unwrap().unwrap();
            assert_eq!(record.status, GenerationStatus::Failed);
            assert_eq!(record.failure_reason.as_deref(), Some("image model down"));
            assert!(record.completed_at.is_some());
        }

        #[tokio::test]
        async fn reapplying_failure_keeps_the_first_reason() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::En, None),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();

            store.mark_failed(&id, "first reason").await.unwrap();
            store.mark_failed(&id, "second reason").await.unwrap();

            let record = store.fetch(&id).await.unwrap().unwrap();
            assert_eq!(record.failure_reason.as_deref(), Some("first reason"));
        }

        #[tokio::test]
        async fn completed_record_cannot_fail() {
            let store = new_store();
            let id = store
                .persist_initial(
                    None,
                    &sample_input(Language::En, None),
                    &sample_pedagogy("The fox sleeps."),
                )
                .await
                .unwrap();
            let (image, audio) = locations();
            store.persist_final(&id, &image, &audio).await.unwrap();

            let err = store.mark_failed(&id, "too late").await.unwrap_err();
            assert!(matches!(persist_err(err), PersistError::Conflict(_)));
        }

        #[tokio::test]
        async fn missing_record_is_not_found() {
            let store = new_store();
            let err = store
                .mark_failed(&GenerationId::from("nope"), "reason")
                .await
                .unwrap_err();
            assert!(matches!(persist_err(err), PersistError::NotFound(_)));
        }
    }

    mod history {
        use super::*;

        async fn seed(
            store: &GenerationStore,
            language: Language,
            age: Option<u8>,
            sentence: &str,
        ) {
            store
                .persist_initial(None, &sample_input(language, age), &sample_pedagogy(sentence))
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn newest_sentences_come_first() {
            let store = new_store();
            seed(&store, Language::En, Some(4), "first").await;
            seed(&store, Language::En, Some(4), "second").await;
            seed(&store, Language::En, Some(4), "third").await;

            let recent = store
                .fetch_recent(Language::En, Some(4), DEFAULT_HISTORY_LIMIT)
                .await
                .unwrap();
            assert_eq!(recent, vec!["third", "second", "first"]);
        }

        #[tokio::test]
        async fn profile_filter_matches_language_and_age() {
            let store = new_store();
            seed(&store, Language::En, Some(4), "en-four").await;
            seed(&store, Language::Fr, Some(4), "fr-four").await;
            seed(&store, Language::En, Some(5), "en-five").await;

            let recent = store
                .fetch_recent(Language::En, Some(4), DEFAULT_HISTORY_LIMIT)
                .await
                .unwrap();
            assert_eq!(recent, vec!["en-four"]);
        }

        #[tokio::test]
        async fn missing_age_matches_only_missing_age() {
            let store = new_store();
            seed(&store, Language::En, Some(4), "with-age").await;
            seed(&store, Language::En, None, "no-age").await;

            let recent = store
                .fetch_recent(Language::En, None, DEFAULT_HISTORY_LIMIT)
                .await
                .unwrap();
            assert_eq!(recent, vec!["no-age"]);
        }

        #[tokio::test]
        async fn limit_caps_the_result() {
            let store = new_store();
            for i in 0..5 {
                seed(&store, Language::En, Some(4), &format!("sentence-{i}")).await;
            }

            let recent = store.fetch_recent(Language::En, Some(4), 2).await.unwrap();
            assert_eq!(recent, vec!["sentence-4", "sentence-3"]);
        }

        #[tokio::test]
        async fn unknown_profile_returns_empty() {
            let store = new_store();
            seed(&store, Language::En, Some(4), "english only").await;

            let recent = store
                .fetch_recent(Language::Fr, Some(6), DEFAULT_HISTORY_LIMIT)
                .await
                .unwrap();
            assert!(recent.is_empty());
        }
    }
}
