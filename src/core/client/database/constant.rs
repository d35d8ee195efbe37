/// Collection holding one document per execution attempt
pub const RECORDS_COLLECTION: &str = "job_monitor_records";

/// Collection holding the sequence counters used for storage-assigned ids
pub const COUNTERS_COLLECTION: &str = "counters";
