/// Upper bound for one length-delimited frame.
///
/// Results of `status` and `help` grow with the cluster list; the default codec
/// limit is too tight for large fleets. Client and server must agree on it.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;
