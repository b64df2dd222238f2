/*!
# KnowMySlots

Backend for tracking outreach slots: contacts, emails, links and PDF documents
grouped by year, season and label.

## Overview

Staff collect contact and email lists for each recruiting season, plus useful
links and PDF documents for each year. The service stores those lists, keeps
their labels unique, and summarises them for a dashboard. Every collection can
be downloaded as a spreadsheet.

## Architecture

### Data Layer
- **group**: the [`group::Group`] document and its (year, season, label) key
- **season**: classification of free-text season strings
- **normalize**: the whitespace policy applied to everything stored
- **store**: four collections behind `RwLock`s, in memory or as JSON files

### Service Layer
- **stats**: dashboard aggregates, recomputed on every request
- **downloader**: XLSX and CSV export
- **loader**: reading exported sheets back in
- **uploads**: writing uploaded PDFs to disk

### HTTP Layer
- **routes**: axum handlers, one module per family of collections
- **error**: mapping of every failure to a status and a JSON message
- **app**: router assembly and the server loop
- **config**: environment configuration

## REST API Endpoints

- `/api/contacts` - Contact groups keyed by year, season and label
- `/api/email` - Email groups, same shape as contacts
- `/api/link` - Link groups keyed by year and label
- `/api/pdf` - PDF groups, including multipart upload via `/append-pdfs`
- `/api/dashboard` - Aggregated contact statistics and export
- `/uploads` - Stored PDF files

## Usage

```
use knowmyslots::{AppState, Database, router};

let state = AppState::new(Database::in_memory(), "uploads");
let app: axum::Router = router(state);
```
*/

pub mod app;
pub mod config;
pub mod downloader;
pub mod error;
pub mod group;
pub mod loader;
pub mod normalize;
pub mod routes;
pub mod season;
pub mod stats;
pub mod store;
pub mod uploads;

pub use app::{AppState, SharedState, router};
pub use config::Config;
pub use error::AppError;
pub use group::{AppendMode, Group, GroupKey, PdfEntry};
pub use season::{Season, SeasonTag};
pub use store::{Collection, Database, StoreError};
