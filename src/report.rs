//! Terminal rendering for listings, search hits and console status.
//!
//! Everything writes to a caller-supplied [`Write`] so the one-shot commands
//! (stdout) and the interactive shell share the same layout.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::io::{self, Write};

use crate::connection::ConnectionPhase;
use crate::console::{Banner, Console};
use crate::models::{DocumentSummary, IndexSummary, SearchHit};
use crate::progress::format_file_size;
use crate::upload::CollectionChoice;

/// Render a service timestamp in local time.
///
/// Accepts RFC 3339 and zone-less ISO 8601 (read as UTC); anything else is
/// returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Local
            .from_utc_datetime(&naive)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }
    raw.to_string()
}

pub fn write_collections(out: &mut impl Write, names: &[String]) -> io::Result<()> {
    if names.is_empty() {
        writeln!(out, "No collections.")?;
        return Ok(());
    }
    for name in names {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

pub fn write_indexes(out: &mut impl Write, indexes: &[IndexSummary]) -> io::Result<()> {
    if indexes.is_empty() {
        writeln!(out, "No indexes found. Upload a document to create one.")?;
        return Ok(());
    }
    writeln!(out, "{:<24} {:>9}  {:<19}  DESCRIPTION", "INDEX", "DOCUMENTS", "CREATED")?;
    for index in indexes {
        writeln!(
            out,
            "{:<24} {:>9}  {:<19}  {}",
            index.name,
            index.document_count,
            format_timestamp(&index.created_at),
            index.description().unwrap_or("-")
        )?;
    }
    Ok(())
}

pub fn write_documents(
    out: &mut impl Write,
    index: &str,
    documents: &[DocumentSummary],
) -> io::Result<()> {
    writeln!(out, "--- Documents in \"{}\" ({}) ---", index, documents.len())?;
    if documents.is_empty() {
        writeln!(out, "No documents in this index.")?;
        return Ok(());
    }
    for doc in documents {
        writeln!(out, "id:        {}", doc.id)?;
        writeln!(out, "filename:  {} ({})", doc.filename, doc.file_type)?;
        writeln!(
            out,
            "size:      {}  chunks: {}",
            format_file_size(doc.size),
            doc.chunks_count
        )?;
        writeln!(out, "uploaded:  {}", format_timestamp(&doc.uploaded_at))?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_search_hits(out: &mut impl Write, hits: &[SearchHit]) -> io::Result<()> {
    if hits.is_empty() {
        writeln!(out, "No results.")?;
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        writeln!(
            out,
            "{}. [{:.3}] {} (document {})",
            rank + 1,
            hit.score,
            hit.filename,
            hit.document_id
        )?;
        let snippet: String = hit.text.chars().take(240).collect();
        writeln!(out, "   {}", snippet.replace('\n', " "))?;
    }
    Ok(())
}

pub fn write_banner(out: &mut impl Write, banner: Option<&Banner>) -> io::Result<()> {
    match banner {
        Some(Banner::Success(text)) => writeln!(out, "ok: {}", text),
        Some(Banner::Error(text)) => writeln!(out, "error: {}", text),
        None => Ok(()),
    }
}

/// Summary of the whole console: connection, upload form, selection.
pub fn write_status(out: &mut impl Write, console: &Console) -> io::Result<()> {
    let conn = console.connection();
    let phase = match conn.phase() {
        ConnectionPhase::Disconnected => "disconnected",
        ConnectionPhase::Connecting => "connecting",
        ConnectionPhase::Connected => "connected",
    };
    writeln!(out, "endpoint:    {}", conn.endpoint())?;
    writeln!(out, "credential:  {}", conn.credential())?;
    writeln!(out, "connection:  {}", phase)?;
    if conn.is_connected() {
        writeln!(out, "collections: {}", conn.collections().join(", "))?;
    }

    let upload = console.upload();
    let collection = match upload.choice() {
        CollectionChoice::Unselected => "(none)".to_string(),
        CollectionChoice::Existing(name) => name.clone(),
        CollectionChoice::CreateNew => format!("new: {}", upload.new_collection_name()),
    };
    let meta = upload.metadata();
    writeln!(out, "collection:  {}", collection)?;
    match upload.selected_file() {
        Some(file) => writeln!(out, "file:        {} ({})", file.name, format_file_size(file.size))?,
        None => writeln!(out, "file:        (none)")?,
    }
    writeln!(
        out,
        "chunking:    size {}  overlap {}  method {}",
        meta.chunk_size, meta.chunk_overlap, meta.chunking_method
    )?;
    if !meta.description.is_empty() {
        writeln!(out, "description: {}", meta.description)?;
    }
    if let Some(index) = console.catalog().selected() {
        writeln!(out, "selected:    {}", index)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_timestamp_is_kept() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp(""), "");
    }

    #[test]
    fn iso_timestamps_are_reformatted() {
        let rendered = format_timestamp("2024-05-01T10:00:00.123456");
        assert_eq!(rendered.len(), "2024-05-01 10:00:00".len());
        assert!(rendered.starts_with("2024-05-0"));
        let rendered = format_timestamp("2024-05-01T10:00:00+00:00");
        assert!(rendered.starts_with("2024-05-0"));
    }

    #[test]
    fn index_table_lists_every_index() {
        let indexes = vec![
            IndexSummary {
                name: "docs-a".into(),
                description: Some("Handbooks".into()),
                document_count: 2,
                created_at: "2024-05-01T10:00:00".into(),
            },
            IndexSummary {
                name: "docs-b".into(),
                description: None,
                document_count: 0,
                created_at: "n/a".into(),
            },
        ];
        let mut out = Vec::new();
        write_indexes(&mut out, &indexes).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("Handbooks"));
        assert!(text.contains("docs-b"));
    }

    #[test]
    fn empty_listings_say_so() {
        let mut out = Vec::new();
        write_indexes(&mut out, &[]).unwrap();
        write_documents(&mut out, "docs-a", &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No indexes found"));
        assert!(text.contains("No documents in this index."));
    }
}
