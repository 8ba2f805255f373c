use chrono::{DateTime, NaiveDate, Utc};

/// Resolves the run's as-of date: an explicit `YYYY-MM-DD` argument wins,
/// otherwise the current UTC date. Crypto markets trade continuously, so
/// there is no close-time cutoff or business-day rollback.
pub fn resolve_run_date(
    run_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = run_date_arg {
        return Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?);
    }
    Ok(now_utc.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn explicit_argument_wins() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let d = resolve_run_date(Some("2026-01-15"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[test]
    fn defaults_to_the_utc_date() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 0, 30, 0).unwrap();
        let d = resolve_run_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
    }

    #[test]
    fn rejects_malformed_dates() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        assert!(resolve_run_date(Some("07-08-2026"), now).is_err());
    }
}
