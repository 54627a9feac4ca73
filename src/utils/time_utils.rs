//! 时间工具模块
//! 提供时间处理相关的工具函数

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// 格式化时间戳为RFC3339格式
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// 获取当前时间戳（秒）
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// 日期平移指定天数
pub fn shift_date(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// 宽松解析日期：先试 YYYY-MM-DD，再试RFC3339
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_date_across_month_boundary() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(
            shift_date(date, 30),
            NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
        );
    }

    #[test]
    fn test_parse_date_lenient() {
        assert_eq!(
            parse_date_lenient("2025-06-01"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(
            parse_date_lenient("2025-06-01T10:00:00Z"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(parse_date_lenient("junk"), None);
    }
}
