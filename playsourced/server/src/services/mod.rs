pub(crate) mod play_source;
