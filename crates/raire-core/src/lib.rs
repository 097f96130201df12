pub mod config;
pub mod coordinator;
pub mod errors;
pub mod export;
pub mod extrema;
pub mod model;
pub mod report;
pub mod solver;
pub mod storage;
pub mod translate;
