// Tests for the Notifier message assembly and row counting
// Workbooks are written with ReportComposer into temp directories

use currency_report::config::MailSettings;
use currency_report::notifier::{count_data_rows, default_subject, Credentials, NotifyError, Notifier};
use currency_report::report::{ReportComposer, ReportRow};
use tempfile::TempDir;

fn credentials() -> Credentials {
    Credentials {
        sender: "sender@example.com".to_string(),
        recipient: "recipient@example.com".to_string(),
        password: "app-password".to_string(),
    }
}

fn sample_rows(count: usize) -> Vec<ReportRow> {
    (0..count)
        .map(|i| {
            let date = format!("{:02}.03.2025", 28 - i);
            let first_rate = 75.0 + i as f64 * 0.25;
            let second_rate = 90.0 + i as f64 * 0.5;
            ReportRow {
                first_date: date.clone(),
                first_rate,
                first_change: Some(-0.25),
                second_date: date,
                second_rate,
                second_change: Some(-0.5),
                cross_rate: second_rate / first_rate,
            }
        })
        .collect()
}

fn write_report(dir: &TempDir, rows: usize) -> std::path::PathBuf {
    ReportComposer::new("USD", "EUR", "courses")
        .with_output_dir(dir.path())
        .write_workbook(&sample_rows(rows))
        .expect("Failed to write report")
}

#[test]
fn test_row_count_round_trip() {
    let dir = TempDir::new().unwrap();
    for rows in [1, 2, 5, 21] {
        let path = write_report(&dir, rows);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(count_data_rows(&bytes).unwrap(), rows);
    }
}

#[tokio::test]
async fn test_build_message_attaches_report() {
    let dir = TempDir::new().unwrap();
    let path = write_report(&dir, 3);

    let notifier = Notifier::new(credentials(), MailSettings::default());
    let message = notifier
        .build_message(&path, &default_subject("USD", "EUR"))
        .await
        .unwrap();

    let envelope = message.envelope();
    assert_eq!(
        envelope.from().map(|a| a.to_string()),
        Some("sender@example.com".to_string())
    );
    assert_eq!(envelope.to().len(), 1);
    assert_eq!(envelope.to()[0].to_string(), "recipient@example.com");

    let formatted = String::from_utf8_lossy(&message.formatted()).into_owned();
    assert!(formatted.contains("multipart/mixed"));
    assert!(formatted.contains("text/plain"));
    assert!(formatted.contains("application/vnd.ms-excel"));
    assert!(formatted.contains("Content-Disposition: attachment"));
    assert!(formatted.contains("courses_USD_EUR.xls"));
    assert!(formatted.contains("Content-Transfer-Encoding: base64"));
}

#[tokio::test]
async fn test_build_message_missing_file() {
    let dir = TempDir::new().unwrap();
    let notifier = Notifier::new(credentials(), MailSettings::default());

    let result = notifier
        .build_message(&dir.path().join("courses_USD_EUR.xls"), "subject")
        .await;
    assert!(matches!(result, Err(NotifyError::Io(_))));
}

#[tokio::test]
async fn test_build_message_invalid_sender() {
    let dir = TempDir::new().unwrap();
    let path = write_report(&dir, 2);

    let notifier = Notifier::new(
        Credentials {
            sender: "not an address".to_string(),
            ..credentials()
        },
        MailSettings::default(),
    );

    let result = notifier.build_message(&path, "subject").await;
    assert!(matches!(result, Err(NotifyError::Address(_))));
}

#[tokio::test]
async fn test_send_report_unreachable_relay() {
    let dir = TempDir::new().unwrap();
    let path = write_report(&dir, 2);

    // Nothing listens on port 9 locally
    let notifier = Notifier::new(
        credentials(),
        MailSettings {
            host: "localhost".to_string(),
            port: 9,
        },
    );

    let result = notifier.send_report(&path, "subject").await;
    assert!(matches!(result, Err(NotifyError::Smtp(_))));
}
