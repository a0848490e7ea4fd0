//! SQLite storage implementation
//!
//! One connection is shared behind a mutex. Plain methods on [`Database`]
//! run as single statements; index maintenance runs through
//! [`Database::write`], which hands a [`StoreTx`] to a closure and commits
//! only if the closure succeeds.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult};
use crate::storage::{IndexEntryRecord, LemmaRecord, Page, SiteRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const PAGE_COLUMNS: &str =
    "p.id, p.site_id, s.url, p.path, p.code, p.content FROM pages p JOIN sites s ON s.id = p.site_id";

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error FROM sites";

/// SQLite database holding sites, pages and the inverted index
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens or creates the database file at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Runs `f` inside one transaction
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise.
    pub fn write<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&StoreTx<'_>) -> StorageResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let result = f(&StoreTx { conn: &tx })?;
        tx.commit()?;
        Ok(result)
    }

    /// Deletes every site; pages, lemmas and index entries cascade
    pub fn clear_all(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM sites", [])?;
        Ok(())
    }

    // ===== Sites =====

    /// Creates or resets the record of a site that is about to be crawled
    pub fn upsert_site_for_crawl(&self, url: &str, name: &str) -> StorageResult<SiteRecord> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sites (url, name, status, status_time, last_error)
             VALUES (?1, ?2, ?3, ?4, NULL)
             ON CONFLICT(url) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                status_time = excluded.status_time,
                last_error = NULL",
            params![url, name, SiteStatus::Crawling.to_db_string(), Utc::now()],
        )?;

        query_site_by_url(&conn, url)?.ok_or_else(|| StorageError::SiteNotFound(url.to_string()))
    }

    /// Returns the site record, creating it with `status` if absent
    pub fn ensure_site(&self, url: &str, name: &str, status: SiteStatus) -> StorageResult<SiteRecord> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sites (url, name, status, status_time, last_error)
             VALUES (?1, ?2, ?3, ?4, NULL)
             ON CONFLICT(url) DO NOTHING",
            params![url, name, status.to_db_string(), Utc::now()],
        )?;

        query_site_by_url(&conn, url)?.ok_or_else(|| StorageError::SiteNotFound(url.to_string()))
    }

    /// Refreshes the heartbeat of a site
    pub fn touch_site(&self, site_id: i64) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sites SET status_time = ?1 WHERE id = ?2",
            params![Utc::now(), site_id],
        )?;
        Ok(())
    }

    /// Records the terminal status of a crawl
    pub fn finish_site(
        &self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![status.to_db_string(), Utc::now(), last_error, site_id],
        )?;
        Ok(())
    }

    pub fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let conn = self.lock()?;
        query_site_by_url(&conn, url)
    }

    pub fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {} ORDER BY id", SITE_COLUMNS))?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    pub fn count_sites(&self) -> StorageResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM sites", [], |row| row.get(0))?;
        Ok(count)
    }

    // ===== Pages =====

    /// Inserts a page unless one with the same `(site_id, path)` exists
    ///
    /// Returns the new id, or `None` if the page was already stored.
    pub fn insert_page(&self, page: &Page) -> StorageResult<Option<i64>> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
            params![page.site_id, page.path, page.code, page.content],
        )?;

        if inserted == 0 {
            Ok(None)
        } else {
            Ok(Some(conn.last_insert_rowid()))
        }
    }

    /// Inserts a page or replaces the code and content of the stored one
    pub fn upsert_page(&self, page: &Page) -> StorageResult<i64> {
        let conn = self.lock()?;
        upsert_page_on(&conn, page)
    }

    /// Upserts every page in one transaction and returns them with ids
    pub fn save_pages(&self, pages: Vec<Page>) -> StorageResult<Vec<Page>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut saved = Vec::with_capacity(pages.len());
        for mut page in pages {
            page.id = Some(upsert_page_on(&tx, &page)?);
            saved.push(page);
        }

        tx.commit()?;
        Ok(saved)
    }

    /// Replaces the code and content of an already stored page
    pub fn update_page(&self, page: &Page) -> StorageResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE pages SET code = ?1, content = ?2 WHERE site_id = ?3 AND path = ?4",
            params![page.code, page.content, page.site_id, page.path],
        )?;

        if updated == 0 {
            return Err(StorageError::PageNotFound(page.url()));
        }
        Ok(())
    }

    pub fn page_exists(&self, site_id: i64, path: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let exists = conn
            .query_row(
                "SELECT 1 FROM pages WHERE site_id = ?1 AND path = ?2",
                params![site_id, path],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    pub fn get_page(&self, site_id: i64, path: &str) -> StorageResult<Option<Page>> {
        let conn = self.lock()?;
        let page = conn
            .query_row(
                &format!("SELECT {} WHERE p.site_id = ?1 AND p.path = ?2", PAGE_COLUMNS),
                params![site_id, path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    /// Loads pages by id, skipping ids that no longer exist
    pub fn get_pages_by_ids(&self, ids: &[i64]) -> StorageResult<Vec<Page>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {} WHERE p.id = ?1", PAGE_COLUMNS))?;

        let mut pages = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(page) = stmt.query_row(params![id], page_from_row).optional()? {
                pages.push(page);
            }
        }
        Ok(pages)
    }

    pub fn list_pages(&self, site_id: i64) -> StorageResult<Vec<Page>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} WHERE p.site_id = ?1 ORDER BY p.path",
            PAGE_COLUMNS
        ))?;
        let pages = stmt
            .query_map(params![site_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    /// Counts pages of one site, or of all sites
    pub fn count_pages(&self, site_id: Option<i64>) -> StorageResult<i64> {
        let conn = self.lock()?;
        let count = match site_id {
            Some(id) => conn.query_row(
                "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    // ===== Lemmas and index =====

    /// Looks up the lemma rows of one site matching any of `lemmas`
    pub fn find_lemmas(&self, site_id: i64, lemmas: &[String]) -> StorageResult<Vec<LemmaRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, site_id, lemma, frequency FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
        )?;

        let mut found = Vec::new();
        for lemma in lemmas {
            if let Some(record) = stmt
                .query_row(params![site_id, lemma], lemma_from_row)
                .optional()?
            {
                found.push(record);
            }
        }
        Ok(found)
    }

    /// All index entries attached to the given lemmas
    pub fn index_entries_for_lemmas(&self, lemma_ids: &[i64]) -> StorageResult<Vec<IndexEntryRecord>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, page_id, lemma_id, rank FROM index_entries WHERE lemma_id = ?1")?;

        let mut entries = Vec::new();
        for lemma_id in lemma_ids {
            let rows = stmt.query_map(params![lemma_id], entry_from_row)?;
            for entry in rows {
                entries.push(entry?);
            }
        }
        Ok(entries)
    }

    /// Counts lemmas of one site, or of all sites
    pub fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<i64> {
        let conn = self.lock()?;
        let count = match site_id {
            Some(id) => conn.query_row(
                "SELECT COUNT(*) FROM lemmas WHERE site_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM lemmas", [], |row| row.get(0))?,
        };
        Ok(count)
    }
}

/// Index maintenance operations bound to an open transaction
pub struct StoreTx<'a> {
    conn: &'a Connection,
}

impl StoreTx<'_> {
    pub fn page_id(&self, site_id: i64, path: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM pages WHERE site_id = ?1 AND path = ?2",
                params![site_id, path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn delete_page(&self, page_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM pages WHERE id = ?1", params![page_id])?;
        Ok(())
    }

    pub fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, site_id, lemma, frequency FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
                lemma_from_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn get_lemma(&self, lemma_id: i64) -> StorageResult<Option<LemmaRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, site_id, lemma, frequency FROM lemmas WHERE id = ?1",
                params![lemma_id],
                lemma_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Creates a lemma with frequency 1 unless the site already has it
    ///
    /// Returns the stored row and whether this call created it. A row
    /// created concurrently is re-read rather than reported as an error.
    pub fn insert_lemma_if_absent(
        &self,
        site_id: i64,
        lemma: &str,
    ) -> StorageResult<(LemmaRecord, bool)> {
        let created = self.conn.execute(
            "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, 1)
             ON CONFLICT(site_id, lemma) DO NOTHING",
            params![site_id, lemma],
        )? == 1;

        let record = self
            .find_lemma(site_id, lemma)?
            .ok_or_else(|| StorageError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        Ok((record, created))
    }

    pub fn set_lemma_frequency(&self, lemma_id: i64, frequency: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE lemmas SET frequency = ?1 WHERE id = ?2",
            params![frequency, lemma_id],
        )?;
        Ok(())
    }

    /// Deletes a lemma; its index entries cascade
    pub fn delete_lemma(&self, lemma_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM lemmas WHERE id = ?1", params![lemma_id])?;
        Ok(())
    }

    pub fn page_index_entries(&self, page_id: i64) -> StorageResult<Vec<IndexEntryRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, page_id, lemma_id, rank FROM index_entries WHERE page_id = ?1")?;
        let entries = stmt
            .query_map(params![page_id], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn has_index_entry(&self, page_id: i64, lemma_id: i64) -> StorageResult<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM index_entries WHERE page_id = ?1 AND lemma_id = ?2",
                params![page_id, lemma_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    pub fn upsert_index_entry(&self, page_id: i64, lemma_id: i64, rank: f64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO index_entries (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)
             ON CONFLICT(page_id, lemma_id) DO UPDATE SET rank = excluded.rank",
            params![page_id, lemma_id, rank],
        )?;
        Ok(())
    }

    pub fn delete_page_index_entries(&self, page_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM index_entries WHERE page_id = ?1", params![page_id])?;
        Ok(())
    }
}

fn upsert_page_on(conn: &Connection, page: &Page) -> StorageResult<i64> {
    let id = conn.query_row(
        "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(site_id, path) DO UPDATE SET code = excluded.code, content = excluded.content
         RETURNING id",
        params![page.site_id, page.path, page.code, page.content],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn query_site_by_url(conn: &Connection, url: &str) -> StorageResult<Option<SiteRecord>> {
    let site = conn
        .query_row(
            &format!("SELECT {} WHERE url = ?1", SITE_COLUMNS),
            params![url],
            site_from_row,
        )
        .optional()?;
    Ok(site)
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let status_time: DateTime<Utc> = row.get(4)?;
    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&row.get::<_, String>(3)?).unwrap_or(SiteStatus::Failed),
        status_time,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: Some(row.get(0)?),
        site_id: row.get(1)?,
        site_url: row.get(2)?,
        path: row.get(3)?,
        code: row.get(4)?,
        content: row.get(5)?,
    })
}

fn lemma_from_row(row: &Row<'_>) -> rusqlite::Result<LemmaRecord> {
    Ok(LemmaRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        lemma: row.get(2)?,
        frequency: row.get(3)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<IndexEntryRecord> {
    Ok(IndexEntryRecord {
        id: row.get(0)?,
        page_id: row.get(1)?,
        lemma_id: row.get(2)?,
        rank: row.get(3)?,
    })
}
