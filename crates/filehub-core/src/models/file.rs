use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Stored file as listed by `GET /files/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    /// Storage name; may carry an `uploads/...` prefix.
    pub file_name: String,
    /// URL of the stored object.
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    /// Last path segment of the storage name.
    pub fn display_name(&self) -> &str {
        self.file_name
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.file_name)
    }

    /// MIME type guessed from the stored name, `application/octet-stream` if unknown.
    pub fn file_type(&self) -> String {
        let source = if self.file.is_empty() {
            self.file_name.as_str()
        } else {
            self.file.as_str()
        };
        mime_guess::from_path(source)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::from_name(self.display_name())
    }
}

/// Coarse grouping used for the dashboard's type distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileCategory {
    Image,
    Pdf,
    Document,
    Spreadsheet,
    Presentation,
    Text,
    Compressed,
    Audio,
    Video,
    Unknown,
}

impl FileCategory {
    pub fn from_name(name: &str) -> Self {
        let extension = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return FileCategory::Unknown,
        };
        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" => FileCategory::Image,
            "pdf" => FileCategory::Pdf,
            "doc" | "docx" => FileCategory::Document,
            "xls" | "xlsx" => FileCategory::Spreadsheet,
            "ppt" | "pptx" => FileCategory::Presentation,
            "txt" => FileCategory::Text,
            "zip" | "rar" | "7z" => FileCategory::Compressed,
            "mp3" | "wav" => FileCategory::Audio,
            "mp4" | "avi" | "mov" => FileCategory::Video,
            _ => FileCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Pdf => "pdf",
            FileCategory::Document => "document",
            FileCategory::Spreadsheet => "spreadsheet",
            FileCategory::Presentation => "presentation",
            FileCategory::Text => "text",
            FileCategory::Compressed => "compressed",
            FileCategory::Audio => "audio",
            FileCategory::Video => "video",
            FileCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    Size,
    #[default]
    UploadDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Case-insensitive substring search on the display name, then sort.
pub fn filter_and_sort<'a>(
    files: &'a [FileRecord],
    query: Option<&str>,
    field: SortField,
    direction: SortDirection,
) -> Vec<&'a FileRecord> {
    let needle = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut matched: Vec<&FileRecord> = files
        .iter()
        .filter(|file| match &needle {
            Some(needle) => file.display_name().to_lowercase().contains(needle),
            None => true,
        })
        .collect();

    matched.sort_by(|a, b| {
        let ordering = match field {
            SortField::Name => a
                .display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase()),
            SortField::Size => a.file_size.cmp(&b.file_size),
            SortField::UploadDate => a.uploaded_at.cmp(&b.uploaded_at),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
        .then_with(|| tie_break(a, b))
    });

    matched
}

fn tie_break(a: &FileRecord, b: &FileRecord) -> Ordering {
    a.id.cmp(&b.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: i64, name: &str, size: u64, day: u32) -> FileRecord {
        FileRecord {
            id,
            file_name: format!("uploads/{}", name),
            file: format!("http://files.local/media/uploads/{}", name),
            file_size: size,
            uploaded_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn display_name_strips_directories() {
        assert_eq!(record(1, "report.pdf", 1, 1).display_name(), "report.pdf");
        let mut bare = record(2, "x", 1, 1);
        bare.file_name = "plain.txt".into();
        assert_eq!(bare.display_name(), "plain.txt");
    }

    #[test]
    fn categories_follow_extension() {
        assert_eq!(FileCategory::from_name("a.JPG"), FileCategory::Image);
        assert_eq!(FileCategory::from_name("a.docx"), FileCategory::Document);
        assert_eq!(FileCategory::from_name("a.7z"), FileCategory::Compressed);
        assert_eq!(FileCategory::from_name("README"), FileCategory::Unknown);
        assert_eq!(record(1, "song.mp3", 1, 1).file_type(), "audio/mpeg");
    }

    #[test]
    fn default_sort_is_newest_first() {
        let files = vec![
            record(1, "a.txt", 30, 1),
            record(2, "b.txt", 10, 3),
            record(3, "c.txt", 20, 2),
        ];
        let sorted = filter_and_sort(&files, None, SortField::default(), SortDirection::default());
        let ids: Vec<i64> = sorted.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn search_is_case_insensitive_and_sorts_by_size() {
        let files = vec![
            record(1, "Report-final.pdf", 30, 1),
            record(2, "notes.txt", 10, 3),
            record(3, "report-draft.pdf", 20, 2),
        ];
        let sorted = filter_and_sort(&files, Some("REPORT"), SortField::Size, SortDirection::Asc);
        let ids: Vec<i64> = sorted.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
