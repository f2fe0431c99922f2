use crate::models::analytics::{BucketCount, ConversationDayRow, ConversationsByDay, DocTypeCount, UserMessageStats, UserStats, WeekdayAverage};
use crate::models::feedback::UserFeedbackCounts;
use crate::service::retrieval::DocumentIndex;
use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::warn;

/// Weekday labels as the dashboard renders them, indexed Sunday=0
/// through Saturday=6.
const WEEKDAY_LABELS: [&str; 7] = ["Dimanche", "Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi"];

/// Latency buckets in ascending order. Boundaries are left-inclusive:
/// a 3.0s answer lands in "3-5s", not "< 3s".
const BUCKET_LABELS: [&str; 5] = ["< 3s", "3-5s", "5-10s", "10-15s", "> 15s"];

pub fn weekday_label(num_from_sunday: u32) -> &'static str {
    WEEKDAY_LABELS[num_from_sunday as usize % 7]
}

fn bucket_index(seconds: f64) -> usize {
    if seconds < 3.0 {
        0
    } else if seconds < 5.0 {
        1
    } else if seconds < 10.0 {
        2
    } else if seconds < 15.0 {
        3
    } else {
        4
    }
}

/// Bucket every measured response time. All five buckets are always
/// present, in ascending latency order.
pub fn response_time_distribution(times: &[f64]) -> Vec<BucketCount> {
    let mut counts = [0u64; 5];
    for &seconds in times {
        counts[bucket_index(seconds)] += 1;
    }

    BUCKET_LABELS
        .iter()
        .zip(counts)
        .map(|(label, count)| BucketCount {
            bucket: label.to_string(),
            count,
        })
        .collect()
}

/// Attach the weekday label to each per-day conversation count.
pub fn label_conversation_days(rows: Vec<ConversationDayRow>) -> Vec<ConversationsByDay> {
    rows.into_iter()
        .map(|row| ConversationsByDay {
            weekday: weekday_label(row.day.weekday().num_days_from_sunday()).to_string(),
            date: row.day,
            conversations: row.conversations,
        })
        .collect()
}

/// Mean daily conversation volume per weekday: for each weekday, the
/// sum of that weekday's daily counts divided by the number of distinct
/// calendar days observed on it. Two Mondays with 3 and 5 conversations
/// average to 4, not 8.
pub fn weekday_averages(days: &[ConversationDayRow]) -> Vec<WeekdayAverage> {
    let mut totals = [0i64; 7];
    let mut observed_days = [0i64; 7];

    for row in days {
        let weekday = row.day.weekday().num_days_from_sunday() as usize;
        totals[weekday] += row.conversations;
        observed_days[weekday] += 1;
    }

    (0..7)
        .filter(|&weekday| observed_days[weekday] > 0)
        .map(|weekday| WeekdayAverage {
            weekday: WEEKDAY_LABELS[weekday].to_string(),
            average: totals[weekday] as f64 / observed_days[weekday] as f64,
        })
        .collect()
}

/// positive / (positive + negative). With no feedback at all the rate
/// is unknown, not 0%.
pub fn satisfaction_rate(positive: i64, negative: i64) -> Option<f64> {
    let total = positive + negative;
    if total == 0 {
        return None;
    }

    Some(positive as f64 / total as f64)
}

pub fn document_kind(filename: &str) -> &'static str {
    if filename.ends_with(".pdf") {
        "PDF"
    } else if filename.ends_with(".xlsx") || filename.ends_with(".xls") {
        "Excel"
    } else if filename.ends_with(".csv") {
        "CSV"
    } else {
        "Autre"
    }
}

/// Count distinct documents and classify them by filename extension.
/// Chunks share their document's `doc_id`; only the first chunk of each
/// document is counted.
pub fn document_census(metadata: &[BTreeMap<String, String>]) -> (u64, Vec<DocTypeCount>) {
    let mut seen: Vec<&str> = Vec::new();
    let mut kinds: BTreeMap<&'static str, u64> = BTreeMap::new();

    for chunk in metadata {
        let Some(doc_id) = chunk.get("doc_id") else { continue };
        if seen.contains(&doc_id.as_str()) {
            continue;
        }
        seen.push(doc_id);

        let filename = chunk.get("filename").map(String::as_str).unwrap_or_default();
        *kinds.entry(document_kind(filename)).or_insert(0) += 1;
    }

    let by_type = kinds
        .into_iter()
        .map(|(kind, count)| DocTypeCount {
            kind: kind.to_string(),
            count,
        })
        .collect();

    (seen.len() as u64, by_type)
}

/// Same census via the live index, degrading to zero counts when the
/// retrieval store is unreachable rather than failing the dashboard.
pub async fn document_census_from(index: &dyn DocumentIndex) -> (u64, Vec<DocTypeCount>) {
    match index.metadata().await {
        Ok(metadata) => document_census(&metadata),
        Err(error) => {
            warn!(error = ?error, "document census unavailable, reporting zero documents");
            (0, Vec::new())
        }
    }
}

/// Join message activity with feedback counts into the per-user
/// leaderboard.
pub fn merge_user_stats(message_stats: Vec<UserMessageStats>, feedback: Vec<UserFeedbackCounts>) -> Vec<UserStats> {
    let feedback_by_user: BTreeMap<String, (i64, i64)> = feedback
        .into_iter()
        .map(|counts| (counts.employee_id, (counts.positive, counts.negative)))
        .collect();

    message_stats
        .into_iter()
        .map(|stats| {
            let (positive, negative) = feedback_by_user.get(&stats.employee_id).copied().unwrap_or((0, 0));
            UserStats {
                satisfaction_rate: satisfaction_rate(positive, negative),
                employee_id: stats.employee_id,
                questions: stats.questions,
                responses: stats.responses,
                conversations: stats.conversations,
                first_activity: stats.first_activity,
                last_activity: stats.last_activity,
                positive_feedbacks: positive,
                negative_feedbacks: negative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        BUCKET_LABELS, bucket_index, document_census, document_census_from, label_conversation_days, merge_user_stats,
        response_time_distribution, satisfaction_rate, weekday_averages, weekday_label,
    };
    use crate::models::analytics::{ConversationDayRow, UserMessageStats};
    use crate::models::feedback::UserFeedbackCounts;
    use crate::service::retrieval::{Document, DocumentIndex};
    use crate::test_utils::StubIndex;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn day(year: i32, month: u32, day_of_month: u32, conversations: i64) -> ConversationDayRow {
        ConversationDayRow {
            day: NaiveDate::from_ymd_opt(year, month, day_of_month).expect("valid date"),
            conversations,
        }
    }

    #[test]
    fn bucket_boundaries_are_left_inclusive() {
        let bucket_of = |seconds: f64| BUCKET_LABELS[bucket_index(seconds)];

        assert_eq!(bucket_of(2.999), "< 3s");
        assert_eq!(bucket_of(3.0), "3-5s");
        assert_eq!(bucket_of(5.0), "5-10s");
        assert_eq!(bucket_of(10.0), "10-15s");
        assert_eq!(bucket_of(14.999), "10-15s");
        assert_eq!(bucket_of(15.0), "> 15s");
    }

    #[test]
    fn distribution_is_ordered_and_complete() {
        let distribution = response_time_distribution(&[4.2, 0.8, 22.0, 4.9]);
        let labels: Vec<&str> = distribution.iter().map(|bucket| bucket.bucket.as_str()).collect();
        assert_eq!(labels, vec!["< 3s", "3-5s", "5-10s", "10-15s", "> 15s"]);

        let counts: Vec<u64> = distribution.iter().map(|bucket| bucket.count).collect();
        assert_eq!(counts, vec![1, 2, 0, 0, 1]);
    }

    #[test]
    fn weekday_average_is_mean_daily_volume() {
        // 2026-01-05 and 2026-01-12 are both Mondays.
        let rows = vec![day(2026, 1, 5, 3), day(2026, 1, 12, 5)];
        let averages = weekday_averages(&rows);
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].weekday, "Lundi");
        assert_eq!(averages[0].average, 4.0);
    }

    #[test]
    fn weekdays_come_out_in_sunday_first_order() {
        // Sunday the 4th, Monday the 5th, Saturday the 10th.
        let rows = vec![day(2026, 1, 10, 1), day(2026, 1, 5, 2), day(2026, 1, 4, 3)];
        let averages = weekday_averages(&rows);
        let labels: Vec<&str> = averages.iter().map(|average| average.weekday.as_str()).collect();
        assert_eq!(labels, vec!["Dimanche", "Lundi", "Samedi"]);
    }

    #[test]
    fn day_labels_match_the_calendar() {
        assert_eq!(weekday_label(0), "Dimanche");
        assert_eq!(weekday_label(6), "Samedi");

        let labelled = label_conversation_days(vec![day(2026, 1, 5, 2)]);
        assert_eq!(labelled[0].weekday, "Lundi");
        assert_eq!(labelled[0].conversations, 2);
    }

    #[test]
    fn satisfaction_is_unknown_without_feedback() {
        assert_eq!(satisfaction_rate(0, 0), None);
        assert_eq!(satisfaction_rate(1, 0), Some(1.0));
        assert_eq!(satisfaction_rate(1, 1), Some(0.5));
    }

    #[test]
    fn census_counts_documents_once_and_classifies_them() {
        let chunk = |doc_id: &str, filename: &str| {
            let mut metadata = BTreeMap::new();
            metadata.insert("doc_id".to_string(), doc_id.to_string());
            metadata.insert("filename".to_string(), filename.to_string());
            metadata
        };

        let metadata = vec![
            chunk("d1", "guide.pdf"),
            chunk("d1", "guide.pdf"),
            chunk("d2", "grille.xlsx"),
            chunk("d3", "effectifs.csv"),
            chunk("d4", "notes.txt"),
            BTreeMap::new(),
        ];

        let (total, by_type) = document_census(&metadata);
        assert_eq!(total, 4);

        let kinds: Vec<(&str, u64)> = by_type.iter().map(|entry| (entry.kind.as_str(), entry.count)).collect();
        assert_eq!(kinds, vec![("Autre", 1), ("CSV", 1), ("Excel", 1), ("PDF", 1)]);
    }

    #[tokio::test]
    async fn census_reads_the_live_index() {
        let index = StubIndex::default();
        let mut metadata = BTreeMap::new();
        metadata.insert("doc_id".to_string(), "d1".to_string());
        metadata.insert("filename".to_string(), "accord-teletravail.pdf".to_string());
        index
            .add_documents(
                &[Document {
                    content: "chunk".to_string(),
                    metadata,
                }],
                &["c1".to_string()],
            )
            .await
            .expect("add");

        let (total, by_type) = document_census_from(&index).await;
        assert_eq!(total, 1);
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].kind, "PDF");
    }

    #[test]
    fn user_stats_merge_defaults_to_zero_feedback() {
        let now = Utc::now();
        let stats = vec![UserMessageStats {
            employee_id: "E123".to_string(),
            questions: 4,
            responses: 4,
            conversations: 2,
            first_activity: now,
            last_activity: now,
        }];
        let feedback = vec![UserFeedbackCounts {
            employee_id: "E999".to_string(),
            positive: 7,
            negative: 1,
        }];

        let merged = merge_user_stats(stats, feedback);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].positive_feedbacks, 0);
        assert_eq!(merged[0].negative_feedbacks, 0);
        assert_eq!(merged[0].satisfaction_rate, None);
    }

    proptest! {
        #[test]
        fn distribution_preserves_every_sample(times in proptest::collection::vec(0.0f64..120.0, 0..64)) {
            let distribution = response_time_distribution(&times);
            let total: u64 = distribution.iter().map(|bucket| bucket.count).sum();
            prop_assert_eq!(total, times.len() as u64);
        }
    }
}
