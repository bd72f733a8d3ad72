// CV ingestion: extract → chunk → embed → upsert, one file at a time.

pub mod handlers;
pub mod ingest;
