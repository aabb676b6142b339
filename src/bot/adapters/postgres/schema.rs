//! Diesel schema for bot persistence.

diesel::table! {
    /// Monitored bot records.
    bots (id) {
        /// Internal bot identifier.
        id -> Uuid,
        /// Unique human-readable bot name.
        #[max_length = 100]
        name -> Varchar,
        /// Unique redirect URL probed by the monitor.
        #[max_length = 500]
        redirect_url -> Varchar,
        /// Health status (`unknown`, `healthy`, `degraded`, `down`).
        #[max_length = 20]
        status -> Varchar,
        /// Consecutive failed probes.
        failures -> Int4,
        /// Timestamp of the last successful probe.
        last_ok -> Nullable<Timestamptz>,
        /// Detail of the last failed probe.
        last_error -> Nullable<Text>,
        /// HTTP status observed by the last probe.
        last_http_status -> Nullable<Int4>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
