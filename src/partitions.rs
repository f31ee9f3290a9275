//! Yearly range partitions of `accidents_clean`.
//!
//! Each distinct year in the cleaned batch gets a partition `accidents_<year>`
//! covering `[year, year + 1)`. Existing partitions are detected through the
//! catalog first, so provisioning the same years twice is a no-op.

use std::collections::BTreeSet;

use anyhow::Result;
use sqlx::PgPool;

use crate::models::CleanRecord;
use crate::schema::TABLE_NAME;

/// A single yearly partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearPartition {
    pub year: i32,
}

impl YearPartition {
    pub fn name(&self) -> String {
        format!("accidents_{}", self.year)
    }

    /// Inclusive lower and exclusive upper bound.
    pub fn bounds(&self) -> (i32, i32) {
        (self.year, self.year + 1)
    }

    pub fn create_sql(&self) -> String {
        // ---
        let (from, to) = self.bounds();
        format!(
            "CREATE TABLE {} PARTITION OF {} FOR VALUES FROM ({}) TO ({})",
            self.name(),
            TABLE_NAME,
            from,
            to
        )
    }
}

// ---

/// Distinct partitions needed for `records`, in ascending year order.
pub fn partitions_for(records: &[CleanRecord]) -> Vec<YearPartition> {
    // ---
    records
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .map(|year| YearPartition { year })
        .collect()
}

/// Create every missing partition. Returns the names created by this call.
pub async fn provision_partitions(pool: &PgPool, partitions: &[YearPartition]) -> Result<Vec<String>> {
    // ---
    let mut created = Vec::new();
    let mut tx = pool.begin().await?;

    for partition in partitions {
        let name = partition.name();

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_tables WHERE tablename = $1)")
                .bind(&name)
                .fetch_one(&mut *tx)
                .await?;

        if exists {
            tracing::debug!("Partition {} already exists", name);
            continue;
        }

        sqlx::query(&partition.create_sql()).execute(&mut *tx).await?;
        tracing::info!("Partition created: {} (year={})", name, partition.year);
        created.push(name);
    }

    tx.commit().await?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::AlcoholStatus;
    use chrono::NaiveDate;

    fn record(id: i32, year: i32) -> CleanRecord {
        // ---
        CleanRecord {
            submission_id: id,
            date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            time: None,
            region: None,
            accident_type: None,
            alcohol_status: AlcoholStatus::Unknown,
            year,
            month: 1,
            hour: None,
        }
    }

    #[test]
    fn test_partition_names_and_bounds() {
        // ---
        let parts = partitions_for(&[record(1, 2021), record(2, 2020), record(3, 2021)]);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name(), "accidents_2020");
        assert_eq!(parts[0].bounds(), (2020, 2021));
        assert_eq!(parts[1].name(), "accidents_2021");
        assert_eq!(parts[1].bounds(), (2021, 2022));
    }

    #[test]
    fn test_create_sql() {
        // ---
        let sql = YearPartition { year: 2020 }.create_sql();
        assert_eq!(
            sql,
            "CREATE TABLE accidents_2020 PARTITION OF accidents_clean FOR VALUES FROM (2020) TO (2021)"
        );
    }

    #[test]
    fn test_no_records_no_partitions() {
        // ---
        assert!(partitions_for(&[]).is_empty());
    }
}
