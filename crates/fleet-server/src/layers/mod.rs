pub(crate) mod audit;
pub(crate) mod commands;
pub(crate) mod control;
pub(crate) mod service;
