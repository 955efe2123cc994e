pub(crate) mod engine;

pub(crate) mod faulty_db;

pub(crate) mod headers;

pub(crate) mod logging;

pub(crate) mod nodes;
