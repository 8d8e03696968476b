//! SQLite-backed print request store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use super::{
    AttachedFile, CreatePrintRequest, NewAttachedFile, PrintRequest, RequestError, RequestFields,
    RequestFilter, RequestStatus, RequestStore, RequestUpdate, RequestWindow, Search,
    UpdatePrintRequest,
};

const REQUEST_COLUMNS: &str = "r.id, r.owner, r.document_count, r.page_count, r.duplex, r.staple, r.print_type, r.note, r.status, r.created_at, r.updated_at";

const FILE_COLUMNS: &str =
    "id, request_id, filename, storage_key, content_type, size_bytes, sha256, uploaded_at";

/// SQLite-backed print request store.
pub struct SqliteRequestStore {
    conn: Mutex<Connection>,
}

impl SqliteRequestStore {
    /// Create a new SQLite request store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, RequestError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite request store (useful for testing).
    pub fn in_memory() -> Result<Self, RequestError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RequestError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS print_requests (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                owner_key TEXT NOT NULL,
                document_count INTEGER NOT NULL CHECK (document_count > 0),
                page_count INTEGER NOT NULL CHECK (page_count > 0),
                duplex INTEGER NOT NULL,
                staple INTEGER NOT NULL,
                print_type TEXT NOT NULL,
                note TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_print_requests_owner ON print_requests(owner);
            CREATE INDEX IF NOT EXISTS idx_print_requests_status ON print_requests(status);
            CREATE INDEX IF NOT EXISTS idx_print_requests_created_at ON print_requests(created_at DESC);

            CREATE TABLE IF NOT EXISTS request_files (
                id TEXT PRIMARY KEY,
                request_id TEXT NOT NULL REFERENCES print_requests(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                filename TEXT NOT NULL,
                filename_key TEXT NOT NULL,
                storage_key TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                sha256 TEXT NOT NULL,
                uploaded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_request_files_request_id ON request_files(request_id);
            "#,
        )
        .map_err(db_err)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RequestError> {
        self.conn
            .lock()
            .map_err(|_| RequestError::Database("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &RequestFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("r.status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(ref owner) = filter.owner {
            conditions.push("r.owner = ?");
            params.push(Box::new(owner.clone()));
        }

        // Search keys are lowercased in Rust on write; SQLite's LOWER() only
        // folds ASCII. EXISTS keeps a request matching through several files
        // to one row.
        match filter.search {
            Some(Search::OwnerOrFilename(ref term)) => {
                let pattern = like_pattern(term);
                conditions.push(
                    "(r.owner_key LIKE ? ESCAPE '\\' OR EXISTS (SELECT 1 FROM request_files f WHERE f.request_id = r.id AND f.filename_key LIKE ? ESCAPE '\\'))",
                );
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }
            Some(Search::Filename(ref term)) => {
                conditions.push(
                    "EXISTS (SELECT 1 FROM request_files f WHERE f.request_id = r.id AND f.filename_key LIKE ? ESCAPE '\\')",
                );
                params.push(Box::new(like_pattern(term)));
            }
            None => {}
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_request(row: &rusqlite::Row) -> rusqlite::Result<PrintRequest> {
        let print_type: String = row.get(6)?;
        let status: String = row.get(8)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;

        Ok(PrintRequest {
            id: row.get(0)?,
            owner: row.get(1)?,
            fields: RequestFields {
                document_count: row.get(2)?,
                page_count: row.get(3)?,
                duplex: row.get(4)?,
                staple: row.get(5)?,
                print_type: print_type
                    .parse()
                    .map_err(|e: String| conversion_err(6, e))?,
                note: row.get(7)?,
            },
            status: status.parse().map_err(|e: String| conversion_err(8, e))?,
            created_at: parse_timestamp(9, &created_at)?,
            updated_at: parse_timestamp(10, &updated_at)?,
            files: Vec::new(),
        })
    }

    fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<AttachedFile> {
        let size_bytes: i64 = row.get(5)?;
        let uploaded_at: String = row.get(7)?;

        Ok(AttachedFile {
            id: row.get(0)?,
            request_id: row.get(1)?,
            filename: row.get(2)?,
            storage_key: row.get(3)?,
            content_type: row.get(4)?,
            size_bytes: u64::try_from(size_bytes).map_err(|e| conversion_err(5, e.to_string()))?,
            sha256: row.get(6)?,
            uploaded_at: parse_timestamp(7, &uploaded_at)?,
        })
    }

    fn load_files(conn: &Connection, request_id: &str) -> Result<Vec<AttachedFile>, RequestError> {
        let sql = format!(
            "SELECT {} FROM request_files WHERE request_id = ? ORDER BY position ASC",
            FILE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![request_id], Self::row_to_file)
            .map_err(db_err)?;

        let mut files = Vec::new();
        for row_result in rows {
            files.push(row_result.map_err(db_err)?);
        }
        Ok(files)
    }

    /// Load one request with its files; `None` if absent.
    fn fetch(conn: &Connection, id: &str) -> Result<Option<PrintRequest>, RequestError> {
        let sql = format!("SELECT {} FROM print_requests r WHERE r.id = ?", REQUEST_COLUMNS);
        let request = conn
            .query_row(&sql, params![id], Self::row_to_request)
            .optional()
            .map_err(db_err)?;

        match request {
            Some(mut request) => {
                request.files = Self::load_files(conn, id)?;
                Ok(Some(request))
            }
            None => Ok(None),
        }
    }

    fn fetch_existing(conn: &Connection, id: &str) -> Result<PrintRequest, RequestError> {
        Self::fetch(conn, id)?.ok_or_else(|| RequestError::NotFound(id.to_string()))
    }

    fn select_matching(
        conn: &Connection,
        filter: &RequestFilter,
    ) -> Result<Vec<PrintRequest>, RequestError> {
        let (where_clause, params) = Self::build_where_clause(filter);

        // rowid breaks ties between requests created within the same microsecond
        let sql = format!(
            "SELECT {} FROM print_requests r {} ORDER BY r.created_at DESC, r.rowid DESC LIMIT ? OFFSET ?",
            REQUEST_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        // LIMIT -1 is unbounded in SQLite
        all_params.push(Box::new(filter.limit.unwrap_or(-1)));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_request)
            .map_err(db_err)?;

        let mut requests = Vec::new();
        for row_result in rows {
            requests.push(row_result.map_err(db_err)?);
        }

        for request in &mut requests {
            request.files = Self::load_files(conn, &request.id)?;
        }

        Ok(requests)
    }

    fn count_matching(conn: &Connection, filter: &RequestFilter) -> Result<i64, RequestError> {
        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM print_requests r {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(db_err)
    }

    fn insert_files(
        tx: &Transaction<'_>,
        request_id: &str,
        files: &[NewAttachedFile],
        uploaded_at: DateTime<Utc>,
    ) -> Result<(), RequestError> {
        for (position, file) in files.iter().enumerate() {
            let size_bytes = i64::try_from(file.size_bytes)
                .map_err(|_| RequestError::Validation(format!("file too large: {}", file.filename)))?;
            tx.execute(
                "INSERT INTO request_files (id, request_id, position, filename, filename_key, storage_key, content_type, size_bytes, sha256, uploaded_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    request_id,
                    position as i64,
                    file.filename,
                    search_key(&file.filename),
                    file.storage_key,
                    file.content_type,
                    size_bytes,
                    file.sha256,
                    format_timestamp(&uploaded_at),
                ],
            )
            .map_err(db_err)?;
        }
        Ok(())
    }
}

impl RequestStore for SqliteRequestStore {
    fn create(&self, request: CreatePrintRequest) -> Result<PrintRequest, RequestError> {
        if request.owner.trim().is_empty() {
            return Err(RequestError::Validation("owner is required".to_string()));
        }
        let fields = request.fields.validated().map_err(RequestError::Validation)?;
        validate_files(&request.files)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();

        tx.execute(
            "INSERT INTO print_requests (id, owner, owner_key, document_count, page_count, duplex, staple, print_type, note, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.owner,
                search_key(&request.owner),
                fields.document_count,
                fields.page_count,
                fields.duplex,
                fields.staple,
                fields.print_type.as_str(),
                fields.note,
                RequestStatus::Pending.as_str(),
                format_timestamp(&now),
                format_timestamp(&now),
            ],
        )
        .map_err(db_err)?;

        Self::insert_files(&tx, &id, &request.files, now)?;

        let created = Self::fetch_existing(&tx, &id)?;
        tx.commit().map_err(db_err)?;

        Ok(created)
    }

    fn get(&self, id: &str) -> Result<PrintRequest, RequestError> {
        let conn = self.lock()?;
        Self::fetch_existing(&conn, id)
    }

    fn update(&self, id: &str, update: UpdatePrintRequest) -> Result<RequestUpdate, RequestError> {
        let fields = update.fields.validated().map_err(RequestError::Validation)?;
        if let Some(ref files) = update.files {
            validate_files(files)?;
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let current = Self::fetch_existing(&tx, id)?;
        if current.status != RequestStatus::Pending {
            return Err(RequestError::InvalidState {
                request_id: id.to_string(),
                current_status: current.status,
                operation: "edit".to_string(),
            });
        }

        let now = timestamp_now();
        tx.execute(
            "UPDATE print_requests SET document_count = ?, page_count = ?, duplex = ?, staple = ?, print_type = ?, note = ?, updated_at = ? WHERE id = ?",
            params![
                fields.document_count,
                fields.page_count,
                fields.duplex,
                fields.staple,
                fields.print_type.as_str(),
                fields.note,
                format_timestamp(&now),
                id,
            ],
        )
        .map_err(db_err)?;

        let replaced_files = match update.files {
            Some(files) => {
                tx.execute(
                    "DELETE FROM request_files WHERE request_id = ?",
                    params![id],
                )
                .map_err(db_err)?;
                Self::insert_files(&tx, id, &files, now)?;
                current.files
            }
            None => Vec::new(),
        };

        let request = Self::fetch_existing(&tx, id)?;
        tx.commit().map_err(db_err)?;

        Ok(RequestUpdate {
            request,
            replaced_files,
        })
    }

    fn update_status(
        &self,
        id: &str,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<PrintRequest, RequestError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let current = Self::fetch_existing(&tx, id)?;
        if current.status != expected {
            return Err(RequestError::InvalidState {
                request_id: id.to_string(),
                current_status: current.status,
                operation: status_operation(next).to_string(),
            });
        }

        tx.execute(
            "UPDATE print_requests SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
            params![
                next.as_str(),
                format_timestamp(&timestamp_now()),
                id,
                expected.as_str()
            ],
        )
        .map_err(db_err)?;

        let updated = Self::fetch_existing(&tx, id)?;
        tx.commit().map_err(db_err)?;

        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<PrintRequest, RequestError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let request = Self::fetch_existing(&tx, id)?;

        // File rows go with the request through ON DELETE CASCADE
        tx.execute("DELETE FROM print_requests WHERE id = ?", params![id])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(request)
    }

    fn list(&self, filter: &RequestFilter) -> Result<Vec<PrintRequest>, RequestError> {
        let conn = self.lock()?;
        Self::select_matching(&conn, filter)
    }

    fn count(&self, filter: &RequestFilter) -> Result<i64, RequestError> {
        let conn = self.lock()?;
        Self::count_matching(&conn, filter)
    }

    fn list_window(
        &self,
        filter: &RequestFilter,
        place: &dyn Fn(i64) -> (i64, i64),
    ) -> Result<RequestWindow, RequestError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let total = Self::count_matching(&tx, filter)?;
        let (limit, offset) = place(total);
        let window = filter.clone().with_limit(limit).with_offset(offset);
        let items = Self::select_matching(&tx, &window)?;

        tx.commit().map_err(db_err)?;

        Ok(RequestWindow { total, items })
    }
}

fn validate_files(files: &[NewAttachedFile]) -> Result<(), RequestError> {
    for file in files {
        if file.filename.trim().is_empty() {
            return Err(RequestError::Validation(
                "attached files need a filename".to_string(),
            ));
        }
        if file.storage_key.is_empty() {
            return Err(RequestError::Validation(format!(
                "file {} has no storage key",
                file.filename
            )));
        }
    }
    Ok(())
}

fn status_operation(next: RequestStatus) -> &'static str {
    match next {
        RequestStatus::Concluded => "approve",
        RequestStatus::Rejected => "reject",
        RequestStatus::Pending => "reopen",
    }
}

/// Case-folded form of an owner or filename, matched by searches.
fn search_key(value: &str) -> String {
    value.to_lowercase()
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in search_key(term.trim()).chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Microsecond precision keeps stored timestamps lexicographically ordered.
fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn conversion_err(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn db_err(e: rusqlite::Error) -> RequestError {
    RequestError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PrintType;

    fn create_test_store() -> SqliteRequestStore {
        SqliteRequestStore::in_memory().unwrap()
    }

    fn test_fields() -> RequestFields {
        RequestFields {
            document_count: 3,
            page_count: 10,
            duplex: true,
            staple: false,
            print_type: PrintType::BlackAndWhite,
            note: None,
        }
    }

    fn test_file(name: &str) -> NewAttachedFile {
        NewAttachedFile {
            filename: name.to_string(),
            storage_key: format!("key-{}", name),
            content_type: "application/pdf".to_string(),
            size_bytes: 1024,
            sha256: "ab".repeat(32),
        }
    }

    fn create_request(owner: &str, files: Vec<NewAttachedFile>) -> CreatePrintRequest {
        CreatePrintRequest {
            owner: owner.to_string(),
            fields: test_fields(),
            files,
        }
    }

    #[test]
    fn test_create_request() {
        let store = create_test_store();

        let request = store
            .create(create_request("smith", vec![test_file("syllabus.pdf")]))
            .unwrap();

        assert!(!request.id.is_empty());
        assert_eq!(request.owner, "smith");
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.fields, test_fields());
        assert_eq!(request.files.len(), 1);
        assert_eq!(request.files[0].filename, "syllabus.pdf");
        assert_eq!(request.files[0].request_id, request.id);
    }

    #[test]
    fn test_create_rejects_zero_counts() {
        let store = create_test_store();
        let mut request = create_request("smith", vec![]);
        request.fields.page_count = 0;

        let result = store.create(request);
        assert!(matches!(result, Err(RequestError::Validation(_))));
        assert_eq!(store.count(&RequestFilter::new()).unwrap(), 0);
    }

    #[test]
    fn test_create_rejects_blank_owner() {
        let store = create_test_store();
        let result = store.create(create_request(" ", vec![]));
        assert!(matches!(result, Err(RequestError::Validation(_))));
    }

    #[test]
    fn test_get_roundtrips_created_record() {
        let store = create_test_store();
        let created = store
            .create(create_request("smith", vec![test_file("a.pdf"), test_file("b.pdf")]))
            .unwrap();

        let fetched = store.get(&created.id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_get_nonexistent_request() {
        let store = create_test_store();
        let result = store.get("nonexistent-id");
        assert!(matches!(result, Err(RequestError::NotFound(_))));
    }

    #[test]
    fn test_update_keeps_files_when_none_supplied() {
        let store = create_test_store();
        let created = store
            .create(create_request("smith", vec![test_file("a.pdf")]))
            .unwrap();

        let mut fields = test_fields();
        fields.staple = true;
        fields.note = Some("grampear por aluno".to_string());

        let outcome = store
            .update(&created.id, UpdatePrintRequest { fields, files: None })
            .unwrap();

        assert!(outcome.request.fields.staple);
        assert_eq!(outcome.request.files, created.files);
        assert!(outcome.replaced_files.is_empty());
    }

    #[test]
    fn test_update_replaces_all_files() {
        let store = create_test_store();
        let created = store
            .create(create_request("smith", vec![test_file("old1.pdf"), test_file("old2.pdf")]))
            .unwrap();

        let outcome = store
            .update(
                &created.id,
                UpdatePrintRequest {
                    fields: test_fields(),
                    files: Some(vec![test_file("new.pdf")]),
                },
            )
            .unwrap();

        let names: Vec<_> = outcome.request.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["new.pdf"]);
        assert_eq!(outcome.replaced_files.len(), 2);

        let fetched = store.get(&created.id).unwrap();
        assert_eq!(fetched.files, outcome.request.files);
    }

    #[test]
    fn test_update_non_pending_fails_and_leaves_record_unchanged() {
        let store = create_test_store();
        let created = store
            .create(create_request("smith", vec![test_file("a.pdf")]))
            .unwrap();
        store
            .update_status(&created.id, RequestStatus::Pending, RequestStatus::Concluded)
            .unwrap();
        let before = store.get(&created.id).unwrap();

        let mut fields = test_fields();
        fields.document_count = 99;
        let result = store.update(
            &created.id,
            UpdatePrintRequest {
                fields,
                files: Some(vec![test_file("other.pdf")]),
            },
        );

        assert!(matches!(
            result,
            Err(RequestError::InvalidState {
                current_status: RequestStatus::Concluded,
                ..
            })
        ));
        assert_eq!(store.get(&created.id).unwrap(), before);
    }

    #[test]
    fn test_update_status_transitions() {
        let store = create_test_store();
        let created = store.create(create_request("smith", vec![])).unwrap();

        let updated = store
            .update_status(&created.id, RequestStatus::Pending, RequestStatus::Rejected)
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Rejected);
        assert_eq!(store.get(&created.id).unwrap().status, RequestStatus::Rejected);
    }

    #[test]
    fn test_update_status_rejects_stale_expectation() {
        let store = create_test_store();
        let created = store.create(create_request("smith", vec![])).unwrap();
        store
            .update_status(&created.id, RequestStatus::Pending, RequestStatus::Concluded)
            .unwrap();

        let result =
            store.update_status(&created.id, RequestStatus::Pending, RequestStatus::Rejected);

        match result {
            Err(RequestError::InvalidState {
                current_status,
                operation,
                ..
            }) => {
                assert_eq!(current_status, RequestStatus::Concluded);
                assert_eq!(operation, "reject");
            }
            other => panic!("expected InvalidState, got {:?}", other),
        }
        assert_eq!(store.get(&created.id).unwrap().status, RequestStatus::Concluded);
    }

    #[test]
    fn test_update_status_nonexistent_request() {
        let store = create_test_store();
        let result =
            store.update_status("missing", RequestStatus::Pending, RequestStatus::Concluded);
        assert!(matches!(result, Err(RequestError::NotFound(_))));
    }

    #[test]
    fn test_delete_cascades_files() {
        let store = create_test_store();
        let created = store
            .create(create_request("smith", vec![test_file("a.pdf"), test_file("b.pdf")]))
            .unwrap();

        let deleted = store.delete(&created.id).unwrap();
        assert_eq!(deleted.files.len(), 2);
        assert!(matches!(store.get(&created.id), Err(RequestError::NotFound(_))));

        let conn = store.lock().unwrap();
        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM request_files WHERE request_id = ?",
                params![created.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_delete_twice_is_not_found() {
        let store = create_test_store();
        let created = store.create(create_request("smith", vec![])).unwrap();

        store.delete(&created.id).unwrap();
        assert!(matches!(
            store.delete(&created.id),
            Err(RequestError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_newest_first() {
        let store = create_test_store();
        let first = store.create(create_request("a", vec![])).unwrap();
        let second = store.create(create_request("b", vec![])).unwrap();
        let third = store.create(create_request("c", vec![])).unwrap();

        let ids: Vec<_> = store
            .list(&RequestFilter::new())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[test]
    fn test_list_with_status_and_owner_filter() {
        let store = create_test_store();
        let a = store.create(create_request("alice", vec![])).unwrap();
        store.create(create_request("alice", vec![])).unwrap();
        store.create(create_request("bob", vec![])).unwrap();
        store
            .update_status(&a.id, RequestStatus::Pending, RequestStatus::Rejected)
            .unwrap();

        let filter = RequestFilter::new().with_owner("alice");
        assert_eq!(store.list(&filter).unwrap().len(), 2);

        let filter = filter.with_status(RequestStatus::Rejected);
        let rejected = store.list(&filter).unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, a.id);
    }

    #[test]
    fn test_search_owner_or_filename_is_case_insensitive() {
        let store = create_test_store();
        store.create(create_request("jsmith", vec![])).unwrap();
        store
            .create(create_request("maria", vec![test_file("Smith_Notes.pdf")]))
            .unwrap();
        store
            .create(create_request("joao", vec![test_file("prova.pdf")]))
            .unwrap();

        let filter = RequestFilter::new().with_search(Search::OwnerOrFilename("SMITH".to_string()));
        let owners: Vec<_> = store
            .list(&filter)
            .unwrap()
            .into_iter()
            .map(|r| r.owner)
            .collect();
        assert_eq!(owners, vec!["maria".to_string(), "jsmith".to_string()]);
        assert_eq!(store.count(&filter).unwrap(), 2);
    }

    #[test]
    fn test_search_filename_ignores_owner() {
        let store = create_test_store();
        store.create(create_request("smith", vec![test_file("a.pdf")])).unwrap();

        let filter = RequestFilter::new().with_search(Search::Filename("smith".to_string()));
        assert!(store.list(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_search_matching_several_files_returns_one_row() {
        let store = create_test_store();
        store
            .create(create_request(
                "smith",
                vec![test_file("lista1.pdf"), test_file("lista2.pdf")],
            ))
            .unwrap();

        let filter = RequestFilter::new().with_search(Search::Filename("lista".to_string()));
        assert_eq!(store.list(&filter).unwrap().len(), 1);
        assert_eq!(store.count(&filter).unwrap(), 1);
    }

    #[test]
    fn test_search_escapes_like_wildcards() {
        let store = create_test_store();
        store
            .create(create_request("smith", vec![test_file("report.pdf")]))
            .unwrap();
        store
            .create(create_request("smith", vec![test_file("100%_final.pdf")]))
            .unwrap();

        let filter = RequestFilter::new().with_search(Search::Filename("%".to_string()));
        let found = store.list(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].files[0].filename, "100%_final.pdf");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = RequestFilter::new().with_search(Search::Filename("  ".to_string()));
        assert!(filter.search.is_none());
    }

    #[test]
    fn test_list_pagination() {
        let store = create_test_store();
        for _ in 0..5 {
            store.create(create_request("smith", vec![])).unwrap();
        }

        let filter = RequestFilter::new().with_limit(2).with_offset(0);
        assert_eq!(store.list(&filter).unwrap().len(), 2);

        let filter = RequestFilter::new().with_limit(2).with_offset(2);
        assert_eq!(store.list(&filter).unwrap().len(), 2);

        let filter = RequestFilter::new().with_limit(2).with_offset(4);
        assert_eq!(store.list(&filter).unwrap().len(), 1);
    }

    #[test]
    fn test_count_with_filter() {
        let store = create_test_store();
        store.create(create_request("smith", vec![])).unwrap();
        let second = store.create(create_request("smith", vec![])).unwrap();
        store
            .update_status(&second.id, RequestStatus::Pending, RequestStatus::Concluded)
            .unwrap();

        let pending = RequestFilter::new().with_status(RequestStatus::Pending);
        assert_eq!(store.count(&pending).unwrap(), 1);
        assert_eq!(store.count(&RequestFilter::new()).unwrap(), 2);
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let store = create_test_store();
        let angela = store
            .create(create_request("ÂNGELA", vec![test_file("APOSTILA_ÇÃO.pdf")]))
            .unwrap();
        store
            .create(create_request("joao", vec![test_file("prova.pdf")]))
            .unwrap();

        for term in ["ÂNGELA", "ângela", "NGEL"] {
            let filter = RequestFilter::new().with_search(Search::OwnerOrFilename(term.to_string()));
            let found = store.list(&filter).unwrap();
            assert_eq!(found.len(), 1, "owner term {:?}", term);
            assert_eq!(found[0].id, angela.id);
        }

        for term in ["ÇÃO", "ção", "apostila_ç"] {
            let filter = RequestFilter::new().with_search(Search::Filename(term.to_string()));
            let found = store.list(&filter).unwrap();
            assert_eq!(found.len(), 1, "filename term {:?}", term);
            assert_eq!(found[0].files[0].filename, "APOSTILA_ÇÃO.pdf");
        }
    }

    #[test]
    fn test_list_without_limit_returns_every_match() {
        let store = create_test_store();
        for _ in 0..120 {
            store.create(create_request("smith", vec![])).unwrap();
        }

        assert_eq!(store.list(&RequestFilter::new()).unwrap().len(), 120);
        assert_eq!(
            store
                .list(&RequestFilter::new().with_offset(100))
                .unwrap()
                .len(),
            20
        );
    }

    #[test]
    fn test_list_window_places_against_its_own_total() {
        let store = create_test_store();
        for _ in 0..5 {
            store.create(create_request("smith", vec![])).unwrap();
        }
        store.create(create_request("jones", vec![])).unwrap();

        let filter = RequestFilter::new().with_owner("smith");
        let window = store
            .list_window(&filter, &|total| {
                assert_eq!(total, 5);
                (2, 4)
            })
            .unwrap();

        assert_eq!(window.total, 5);
        assert_eq!(window.items.len(), 1);
        assert!(window.items.iter().all(|r| r.owner == "smith"));
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("Smith"), "%smith%");
        assert_eq!(like_pattern("ÇÃO"), "%ção%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("printdesk.db");

        let store = SqliteRequestStore::new(&db_path).unwrap();
        let created = store.create(create_request("smith", vec![])).unwrap();

        assert!(db_path.exists());

        // Reopening sees the same data
        drop(store);
        let reopened = SqliteRequestStore::new(&db_path).unwrap();
        assert_eq!(reopened.get(&created.id).unwrap().owner, "smith");
    }
}
