//! CSV and Excel renewal fee reports.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{ColNum, Format, FormatBorder, RowNum, Workbook};

use crate::patent::PatentRecord;
use crate::renewal::RenewalStatus;
use crate::session::QuerySession;

pub const REPORT_TITLE: &str = "특허 연차료 현황 보고서";

/// File name prefix for exported reports.
pub const REPORT_NAME: &str = "특허연차료현황";

pub const SHEET_NAME: &str = "등록특허현황";

pub const HEADERS: [&str; 13] = [
    "번호",
    "출원번호",
    "등록번호",
    "출원인",
    "등록날짜",
    "발명명칭",
    "해당연차수",
    "해당연차료",
    "납부마감일",
    "유효/불납",
    "차기년도납부의뢰",
    "추납기간",
    "회복기간",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const LINE_TERMINATOR: &[u8] = b"\r\n";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Paths of the written report files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

/// Report file name without extension: `특허연차료현황_<customer>_<YYYYMMDD_HHMMSS>`.
#[must_use]
pub fn report_file_stem(customer_number: &str, generated_at: NaiveDateTime) -> String {
    format!(
        "{REPORT_NAME}_{customer_number}_{}",
        generated_at.format(FILE_TIMESTAMP_FORMAT)
    )
}

/// Report field values for each patent, in header order.
#[must_use]
pub fn report_rows(session: &QuerySession) -> Vec<[String; 13]> {
    session
        .patents
        .iter()
        .enumerate()
        .map(|(index, (record, status))| report_row(index + 1, record, status))
        .collect()
}

fn report_row(number: usize, record: &PatentRecord, status: &RenewalStatus) -> [String; 13] {
    [
        number.to_string(),
        record.application_number.clone(),
        record.registration_number_label().to_string(),
        record.applicant_name.clone(),
        crate::date_or_absent(record.registration_date),
        record.short_title(),
        status.year_label(),
        status.fee_label(),
        status.due_date_label(),
        status.status.to_string(),
        status.next_year_label(),
        status.grace_period_label(),
        status.restoration_period_label(),
    ]
}

/// Title block rows shared by both report formats.
fn summary_rows(session: &QuerySession, generated_at: NaiveDateTime) -> [(&'static str, String); 3] {
    [
        ("고객번호", session.customer_number.to_string()),
        ("출원인", session.applicant_name.clone()),
        ("조회일시", generated_at.format(TIMESTAMP_FORMAT).to_string()),
    ]
}

/// Write both the CSV and the Excel report into the output directory.
pub fn export(session: &QuerySession, output_dir: &Path, generated_at: NaiveDateTime) -> Result<ReportFiles> {
    let stem = report_file_stem(session.customer_number.as_str(), generated_at);
    let files = ReportFiles {
        csv: output_dir.join(format!("{stem}.csv")),
        xlsx: output_dir.join(format!("{stem}.xlsx")),
    };
    write_csv(session, &files.csv, generated_at)?;
    if let Err(error) = write_excel(session, &files.xlsx, generated_at) {
        // Both files or neither
        let _ = std::fs::remove_file(&files.csv);
        return Err(error);
    }
    Ok(files)
}

/// Save the report as UTF-8 CSV with a byte order mark.
pub fn write_csv(session: &QuerySession, path: &Path, generated_at: NaiveDateTime) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    file.write_all(UTF8_BOM)?;

    write_records(&mut file, [[REPORT_TITLE]])?;
    file.write_all(LINE_TERMINATOR)?;
    write_records(
        &mut file,
        summary_rows(session, generated_at)
            .iter()
            .map(|(label, value)| [*label, value.as_str()]),
    )?;
    file.write_all(LINE_TERMINATOR)?;
    write_records(
        &mut file,
        std::iter::once(HEADERS.map(String::from)).chain(report_rows(session)),
    )
    .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

/// Write CSV records and flush them to the output.
///
/// Blank lines go straight to the output between calls,
/// since the CSV writer quotes an empty record as `""`.
fn write_records<W, I, T>(output: &mut W, records: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = T>,
    T: IntoIterator,
    T::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(output);
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Save the report as an Excel workbook.
pub fn write_excel(session: &QuerySession, path: &Path, generated_at: NaiveDateTime) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name(SHEET_NAME)?;
    let title_format = Format::new().set_bold().set_font_size(14);
    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_background_color("C6E0B4");

    sheet.write_string_with_format(0, 0, REPORT_TITLE, &title_format)?;
    let mut row: RowNum = 2;
    for (label, value) in summary_rows(session, generated_at) {
        sheet.write_string_with_format(row, 0, label, &Format::new().set_bold())?;
        sheet.write_string(row, 1, value)?;
        row += 1;
    }

    row += 1;
    for (col, header) in (0..).zip(HEADERS) {
        sheet.write_string_with_format(row, col, header, &header_format)?;
    }
    for values in report_rows(session) {
        row += 1;
        for (col, value) in (0 as ColNum..).zip(values) {
            sheet.write_string(row, col, value)?;
        }
    }
    sheet.autofit();

    workbook
        .save(path)
        .with_context(|| format!("Failed to write Excel file: {}", path.display()))?;
    Ok(())
}
