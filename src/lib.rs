/*!
# Enrollment Dashboard

A dashboard of university enrollment statistics by academic year and
department, served as a web page from a Rust server.

## Overview

The dashboard loads a single JSON document describing a faculty's intake
plan, new intake, retained and not-open counts per academic year, each
with a per-department breakdown. It presents the selected year as summary
cards, charts and a searchable, sortable department table.

## Architecture

### Core (no features required)
- **dataset**: typed data model of the JSON document and a consistency
  report that surfaces mismatched totals without correcting them
- **table**: the department filter/sort/aggregate engine and the sort
  toggle rule
- **selection**: page state (year, tab, search, sort) with a pure reducer
  and the record-selection fallback
- **format**: Thai-locale number and timestamp formatting

### Web layer (`web` feature)
- **loader**: one-shot dataset fetch over HTTP (cache bypassed) or from disk
- **config**: command-line and environment configuration
- **graph**: chart series and SVG rendering with plotters
- **downloader**: CSV and XLSX export of the department table
- **render**: handlebars page rendering
- **app**: axum routing, shared load state and the startup load task

## Data flow

Loader populates the dataset, the query string is reduced into a
[`selection::DashboardState`], the state picks a year record, the table
engine filters and sorts that record's departments, and the page renders
the result. UI state lives entirely in the request; the server only holds
the loaded dataset.

## HTTP Endpoints

- `/` - Dashboard page (`year`, `tab`, `q`, `sort`, `dir` query parameters)
- `/api/dataset` - The loaded dataset
- `/api/departments` - Filtered, sorted department rows with totals
- `/api/consistency` - Cross-field mismatches found in the dataset
- `/export/departments.csv`, `/export/departments.xlsx` - Table export
*/

pub mod dataset;
pub mod format;
pub mod selection;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
pub mod downloader;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "web")]
pub mod loader;
#[cfg(feature = "web")]
pub mod render;

/// Re-export the core types to make them easier to use
pub use dataset::*;
pub use selection::*;
pub use table::*;
