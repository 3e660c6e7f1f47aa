//! Recently opened documents and per-page bookmarks, kept in a small SQLite database.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::path::Path;
use tracing::{info, warn};

pub struct History {
    conn: Connection,
    limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentDocument {
    pub path: String,
    pub title: String,
    pub author: String,
    pub format: String,
    pub page_count: usize,
    pub last_page: usize,
    pub last_opened: DateTime<Utc>,
}

/// At most one bookmark per page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub path: String,
    pub page: usize,
    pub title: String,
    pub created: DateTime<Utc>,
}

impl History {
    pub fn new<P: AsRef<Path>>(path: P, limit: usize) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(dir = %parent.display(), error = %e, "cannot create history directory");
            }
        }
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self { conn, limit })
    }

    pub fn in_memory(limit: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn, limit })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS recent_documents (
                id INTEGER PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                author TEXT NOT NULL DEFAULT '',
                format TEXT NOT NULL,
                page_count INTEGER NOT NULL DEFAULT 0,
                last_page INTEGER NOT NULL DEFAULT 1,
                last_opened TEXT NOT NULL,
                seq INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS bookmarks (
                id INTEGER PRIMARY KEY,
                path TEXT NOT NULL,
                page INTEGER NOT NULL,
                title TEXT NOT NULL,
                created TEXT NOT NULL,
                UNIQUE(path, page)
            )",
            [],
        )?;
        Ok(())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Moves `path` to the front of the list, inserting it if new, then drops
    /// whatever falls past the limit. The stored page is left alone.
    pub fn record_open(
        &self,
        path: &str,
        title: &str,
        author: &str,
        format: &str,
        page_count: usize,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO recent_documents (path, title, author, format, page_count, last_opened, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6,
                     (SELECT COALESCE(MAX(seq), 0) + 1 FROM recent_documents))
             ON CONFLICT(path) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                format = excluded.format,
                page_count = excluded.page_count,
                last_opened = excluded.last_opened,
                seq = excluded.seq",
            params![path, title, author, format, page_count as i64, now()],
        )?;
        self.trim()
    }

    pub fn update_position(&self, path: &str, page: usize) -> Result<()> {
        self.conn.execute(
            "UPDATE recent_documents SET last_page = ?1 WHERE path = ?2",
            params![page as i64, path],
        )?;
        Ok(())
    }

    pub fn last_page(&self, path: &str) -> Result<Option<usize>> {
        self.conn
            .query_row(
                "SELECT last_page FROM recent_documents WHERE path = ?1",
                params![path],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map(|page| page.map(|p| p.max(1) as usize))
    }

    /// Most recent first.
    pub fn recent(&self) -> Result<Vec<RecentDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT path, title, author, format, page_count, last_page, last_opened
             FROM recent_documents ORDER BY seq DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![self.limit as i64], |row| {
            let page_count: i64 = row.get(4)?;
            let last_page: i64 = row.get(5)?;
            let last_opened: String = row.get(6)?;
            Ok(RecentDocument {
                path: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                format: row.get(3)?,
                page_count: page_count.max(0) as usize,
                last_page: last_page.max(1) as usize,
                last_opened: parse_time(&last_opened),
            })
        })?;

        let mut docs = Vec::new();
        for doc in rows {
            docs.push(doc?);
        }
        Ok(docs)
    }

    pub fn remove(&self, path: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM recent_documents WHERE path = ?1", params![path])?;
        Ok(n > 0)
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM recent_documents", [])?;
        Ok(())
    }

    /// Bookmarks `page` of `path`. A blank title becomes "Page N". Returns false when
    /// the page was already bookmarked, in which case the existing entry is kept.
    pub fn add_bookmark(&self, path: &str, page: usize, title: &str) -> Result<bool> {
        let title = match title.trim() {
            "" => format!("Page {}", page),
            t => t.to_string(),
        };
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO bookmarks (path, page, title, created) VALUES (?1, ?2, ?3, ?4)",
            params![path, page as i64, title, now()],
        )?;
        if n > 0 {
            info!(path, page, "bookmark added");
        }
        Ok(n > 0)
    }

    pub fn remove_bookmark(&self, path: &str, page: usize) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM bookmarks WHERE path = ?1 AND page = ?2",
            params![path, page as i64],
        )?;
        Ok(n > 0)
    }

    pub fn has_bookmark(&self, path: &str, page: usize) -> Result<bool> {
        self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM bookmarks WHERE path = ?1 AND page = ?2)",
            params![path, page as i64],
            |row| row.get(0),
        )
    }

    /// Adds the bookmark if the page has none, removes it otherwise. Returns whether the
    /// page is bookmarked afterwards.
    pub fn toggle_bookmark(&self, path: &str, page: usize, title: &str) -> Result<bool> {
        if self.remove_bookmark(path, page)? {
            info!(path, page, "bookmark removed");
            return Ok(false);
        }
        self.add_bookmark(path, page, title)?;
        Ok(true)
    }

    /// Bookmarks of one document in page order.
    pub fn bookmarks(&self, path: &str) -> Result<Vec<Bookmark>> {
        let mut stmt = self.conn.prepare(
            "SELECT path, page, title, created FROM bookmarks WHERE path = ?1 ORDER BY page",
        )?;
        let marks = stmt
            .query_map(params![path], bookmark_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(marks)
    }

    fn trim(&self) -> Result<()> {
        self.conn.execute(
            "DELETE FROM recent_documents WHERE id NOT IN (
                SELECT id FROM recent_documents ORDER BY seq DESC LIMIT ?1
            )",
            params![self.limit as i64],
        )?;
        Ok(())
    }
}

fn bookmark_from_row(row: &Row) -> Result<Bookmark> {
    let page: i64 = row.get(1)?;
    let created: String = row.get(3)?;
    Ok(Bookmark {
        path: row.get(0)?,
        page: page.max(1) as usize,
        title: row.get(2)?,
        created: parse_time(&created),
    })
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(history: &History, path: &str) {
        history.record_open(path, "Title", "Author", "EPUB", 10).unwrap();
    }

    #[test]
    fn reopening_moves_to_front_without_duplicates() {
        let history = History::in_memory(20).unwrap();
        open(&history, "/a.epub");
        open(&history, "/b.epub");
        open(&history, "/a.epub");

        let paths: Vec<_> = history.recent().unwrap().into_iter().map(|d| d.path).collect();
        assert_eq!(paths, vec!["/a.epub", "/b.epub"]);
    }

    #[test]
    fn list_is_capped_at_limit() {
        let history = History::in_memory(3).unwrap();
        for i in 0..5 {
            open(&history, &format!("/{}.pdf", i));
        }
        let recent = history.recent().unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].path, "/4.pdf");
        assert_eq!(recent[2].path, "/2.pdf");
        assert!(history.last_page("/0.pdf").unwrap().is_none());
    }

    #[test]
    fn position_survives_reopen() {
        let history = History::in_memory(20).unwrap();
        open(&history, "/a.epub");
        history.update_position("/a.epub", 7).unwrap();
        open(&history, "/a.epub");
        assert_eq!(history.last_page("/a.epub").unwrap(), Some(7));
        assert_eq!(history.recent().unwrap()[0].last_page, 7);
    }

    #[test]
    fn remove_and_clear() {
        let history = History::in_memory(20).unwrap();
        open(&history, "/a.epub");
        open(&history, "/b.epub");
        assert!(history.remove("/a.epub").unwrap());
        assert!(!history.remove("/a.epub").unwrap());
        assert_eq!(history.recent().unwrap().len(), 1);
        history.clear().unwrap();
        assert!(history.recent().unwrap().is_empty());
    }

    #[test]
    fn bookmarks_toggle_per_page() {
        let history = History::in_memory(20).unwrap();
        assert!(history.toggle_bookmark("/a.pdf", 5, "").unwrap());
        assert!(history.toggle_bookmark("/a.pdf", 2, "Opening").unwrap());
        assert!(history.has_bookmark("/a.pdf", 5).unwrap());
        assert!(!history.has_bookmark("/b.pdf", 5).unwrap());

        let marks = history.bookmarks("/a.pdf").unwrap();
        let pages: Vec<_> = marks.iter().map(|b| (b.page, b.title.as_str())).collect();
        assert_eq!(pages, vec![(2, "Opening"), (5, "Page 5")]);

        assert!(!history.toggle_bookmark("/a.pdf", 5, "").unwrap());
        assert!(!history.has_bookmark("/a.pdf", 5).unwrap());
        assert_eq!(history.bookmarks("/a.pdf").unwrap().len(), 1);
    }

    #[test]
    fn duplicate_bookmark_keeps_first_title() {
        let history = History::in_memory(20).unwrap();
        assert!(history.add_bookmark("/a.epub", 3, "First").unwrap());
        assert!(!history.add_bookmark("/a.epub", 3, "Second").unwrap());
        assert_eq!(history.bookmarks("/a.epub").unwrap()[0].title, "First");
        assert!(history.remove_bookmark("/a.epub", 3).unwrap());
        assert!(!history.remove_bookmark("/a.epub", 3).unwrap());
    }

    #[test]
    fn bookmarks_outlive_recent_list() {
        let history = History::in_memory(20).unwrap();
        open(&history, "/a.epub");
        history.add_bookmark("/a.epub", 4, "").unwrap();
        history.clear().unwrap();
        assert_eq!(history.bookmarks("/a.epub").unwrap().len(), 1);
    }

    #[test]
    fn parent_that_is_a_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        assert!(History::new(blocker.join("history.db"), 20).is_err());
    }

    #[test]
    fn persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("history.db");
        {
            let history = History::new(&db, 20).unwrap();
            open(&history, "/a.epub");
        }
        let history = History::new(&db, 20).unwrap();
        assert_eq!(history.recent().unwrap()[0].title, "Title");
    }
}
