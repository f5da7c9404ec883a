use crate::model::CounterRecord;
use crate::transfer::{ExportFormat, ImportEntry};
use std::path::PathBuf;

/// Work handed to the background I/O task.
#[derive(Debug)]
pub enum Action {
    Persist(Vec<CounterRecord>),
    Export {
        format: ExportFormat,
        path: PathBuf,
        counters: Vec<CounterRecord>,
    },
    Import(PathBuf),
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    ImportParsed(Vec<ImportEntry>),
    Error(String),
    Status(String),
}
