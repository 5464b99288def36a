use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use colored::{ColoredString, Colorize};

use patent_fees::history::LastPayment;
use patent_fees::patent::{CustomerNumber, PatentRecord, RegistrationNumber, parse_customer_numbers};
use patent_fees::registry::{KiprisClient, PatentRegistry};
use patent_fees::renewal::{FeeStatus, RenewalStatus};
use patent_fees::report::{self, ReportFiles};
use patent_fees::session::{PaymentLookup, QueryOutcome, QuerySession, lookup_payment, run_query};
use patent_fees::{print_error, print_warning};

use crate::config::Config;
use crate::logger::FileLogger;

/// Pause between customer lookups in a batch to stay within the API rate limit.
const BATCH_DELAY: Duration = Duration::from_secs(1);

const PROGRAM_TITLE: &str = "특허 연차료 조회 시스템";

/// Counters for the final log summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub(crate) queries: usize,
    pub(crate) empty: usize,
    pub(crate) failed: usize,
    pub(crate) patents: usize,
    pub(crate) exports: usize,
    pub(crate) payment_lookups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    SingleQuery,
    BatchQuery,
    Export,
    Exit,
    PaymentHistory,
}

impl MenuChoice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::SingleQuery),
            "2" => Some(Self::BatchQuery),
            "3" => Some(Self::Export),
            "4" => Some(Self::Exit),
            "5" => Some(Self::PaymentHistory),
            _ => None,
        }
    }
}

/// Interactive menu holding the result of the most recent successful query.
pub struct PatentShell<R: PatentRegistry = KiprisClient> {
    config: Config,
    registry: R,
    logger: Option<FileLogger>,
    session: Option<QuerySession>,
    stats: RunStats,
    batch_delay: Duration,
}

impl PatentShell<KiprisClient> {
    /// Create the registry client and the log file.
    ///
    /// # Errors
    /// Returns an error if the registry client cannot be created.
    pub fn new(config: Config) -> Result<Self> {
        let mut registry = KiprisClient::new(&config.base_url, &config.api_key, config.verbose)?;
        if let Some(history_api_key) = &config.history_api_key {
            registry = registry.with_register_history(&config.history_url, history_api_key);
        }
        let logger = match FileLogger::new() {
            Ok(logger) => Some(logger),
            Err(error) => {
                print_warning!("Continuing without log file: {error:#}");
                None
            }
        };
        Ok(Self::with_registry(config, registry, logger))
    }
}

impl<R: PatentRegistry> PatentShell<R> {
    fn with_registry(config: Config, registry: R, mut logger: Option<FileLogger>) -> Self {
        if let Some(logger) = logger.as_mut() {
            logger.log_init(&config);
        }
        Self {
            config,
            registry,
            logger,
            session: None,
            stats: RunStats::default(),
            batch_delay: BATCH_DELAY,
        }
    }

    /// Run the batch for customer numbers given as arguments,
    /// otherwise start the interactive menu.
    pub async fn run(self) {
        let stdin = io::stdin();
        self.run_with_input(&mut stdin.lock()).await;
    }

    async fn run_with_input<B: BufRead>(mut self, input: &mut B) {
        if self.config.verbose {
            println!("{}", format!("Base URL: {}", self.config.base_url).dimmed());
            println!("{}", format!("Output:   {}", self.config.output_dir.display()).dimmed());
        }
        if self.config.customer_numbers.is_empty() {
            self.run_menu(input).await;
        } else {
            let customer_numbers = std::mem::take(&mut self.config.customer_numbers);
            self.run_batch(&customer_numbers).await;
            self.export(Local::now().naive_local());
        }
        self.finish();
    }

    async fn run_menu<B: BufRead>(&mut self, input: &mut B) {
        loop {
            print_menu();
            let Some(line) = self.prompt(input, "선택 (1-5): ") else {
                break;
            };
            match MenuChoice::parse(&line) {
                Some(MenuChoice::SingleQuery) => {
                    let Some(line) = self.prompt(input, "\n고객번호를 입력하세요 (12자리): ") else {
                        break;
                    };
                    self.single_query(&line).await;
                }
                Some(MenuChoice::BatchQuery) => {
                    println!("\n고객번호들을 입력하세요 (쉼표로 구분):");
                    let Some(line) = self.prompt(input, "") else {
                        break;
                    };
                    self.batch_query(&line).await;
                }
                Some(MenuChoice::Export) => {
                    self.export(Local::now().naive_local());
                }
                Some(MenuChoice::Exit) => break,
                Some(MenuChoice::PaymentHistory) => {
                    let Some(line) = self.prompt(input, "\n등록번호를 입력하세요: ") else {
                        break;
                    };
                    self.payment_history(&line).await;
                }
                None => print_error!("잘못된 선택입니다. 1-5 중에서 선택해주세요."),
            }
        }
        println!("\n프로그램을 종료합니다.");
    }

    /// Read one line of input.
    ///
    /// Returns `None` at end of input, or after printing the error if input cannot be read.
    fn prompt<B: BufRead>(&mut self, input: &mut B, prompt: &str) -> Option<String> {
        match read_line(input, prompt) {
            Ok(line) => line,
            Err(error) => {
                print_error!("입력을 읽을 수 없습니다: {error:#}");
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_failure("input", "stdin", &error);
                }
                None
            }
        }
    }

    async fn single_query(&mut self, input: &str) {
        match CustomerNumber::parse(input) {
            Some(customer_number) => self.query(&customer_number, "").await,
            None => print_error!("고객번호는 12자리 숫자여야 합니다."),
        }
    }

    async fn batch_query(&mut self, input: &str) {
        if input.trim().is_empty() {
            print_error!("고객번호를 입력해주세요.");
            return;
        }
        let (customer_numbers, invalid) = parse_customer_numbers(input);
        for entry in &invalid {
            print_warning!("잘못된 고객번호 형식: {entry} (건너뛰기)");
        }
        if customer_numbers.is_empty() {
            print_error!("유효한 고객번호가 없습니다.");
            return;
        }
        self.run_batch(&customer_numbers).await;
    }

    /// Query each customer in order with a fixed delay in between.
    async fn run_batch(&mut self, customer_numbers: &[CustomerNumber]) {
        let total = customer_numbers.len();
        println!("{}", format!("\n배치 처리 시작: {total}개 고객").bold().magenta());
        for (index, customer_number) in customer_numbers.iter().enumerate() {
            self.query(customer_number, &format!("[{}/{total}]", index + 1)).await;
            if index + 1 < total {
                if self.config.verbose {
                    println!("{}", "API 호출 제한을 위해 1초 대기...".dimmed());
                }
                tokio::time::sleep(self.batch_delay).await;
            }
        }
        println!("{}", format!("\n배치 처리 완료: {total}개 고객 처리됨").bold().green());
    }

    /// Query one customer and keep the result if patents were found.
    async fn query(&mut self, customer_number: &CustomerNumber, progress: &str) {
        if progress.is_empty() {
            println!("\n고객번호: {}", customer_number.to_string().cyan());
        } else {
            println!("\n{progress} 고객번호: {}", customer_number.to_string().cyan());
        }
        if let Some(logger) = self.logger.as_mut() {
            logger.log_query(customer_number, progress);
        }
        self.stats.queries += 1;

        match run_query(&self.registry, customer_number, self.config.today()).await {
            QueryOutcome::Found(session) => {
                self.stats.patents += session.len();
                print_session(&session);
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_result(&session);
                }
                self.session = Some(session);
            }
            QueryOutcome::Empty => {
                self.stats.empty += 1;
                print_warning!("등록특허를 찾을 수 없습니다: {customer_number}");
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_empty(customer_number);
                }
            }
            QueryOutcome::Failed(error) => {
                self.stats.failed += 1;
                print_error!("특허 조회 실패 ({customer_number}): {error:#}");
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_failure("query", customer_number.as_str(), &error);
                }
            }
        }
    }

    /// Look up the latest recorded renewal fee payment of a registered patent.
    async fn payment_history(&mut self, input: &str) {
        let Some(registration_number) = RegistrationNumber::parse(input) else {
            print_error!("등록번호는 숫자로 입력해주세요.");
            return;
        };
        self.stats.payment_lookups += 1;
        match lookup_payment(&self.registry, &registration_number, self.session.as_ref()).await {
            Ok(lookup) => {
                print_payment(&lookup);
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_payment(&lookup);
                }
            }
            Err(error) => {
                self.stats.failed += 1;
                print_error!("납부 이력 조회 실패 ({registration_number}): {error:#}");
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_failure("history", registration_number.as_str(), &error);
                }
            }
        }
    }

    /// Write the last query result to CSV and Excel files.
    fn export(&mut self, generated_at: NaiveDateTime) -> Option<ReportFiles> {
        let Some(session) = &self.session else {
            print_warning!("내보낼 데이터가 없습니다. 먼저 특허를 조회해주세요.");
            return None;
        };
        match report::export(session, &self.config.output_dir, generated_at) {
            Ok(files) => {
                println!("{}", format!("CSV 파일이 생성되었습니다:   {}", files.csv.display()).green());
                println!("{}", format!("Excel 파일이 생성되었습니다: {}", files.xlsx.display()).green());
                self.stats.exports += 1;
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_export(&files);
                }
                Some(files)
            }
            Err(error) => {
                print_error!("보고서 생성 실패: {error:#}");
                if let Some(logger) = self.logger.as_mut() {
                    logger.log_failure("export", session.customer_number.as_str(), &error);
                }
                None
            }
        }
    }

    fn finish(&mut self) {
        if let Some(logger) = self.logger.as_mut() {
            logger.log_end(&self.stats);
            if self.config.verbose {
                println!("{}", format!("Log file: {}", logger.path().display()).dimmed());
            }
        }
    }
}

fn print_menu() {
    println!("\n{}", "=".repeat(50));
    println!("{}", PROGRAM_TITLE.bold());
    println!("{}", "=".repeat(50));
    println!("1. 단일 고객번호 조회");
    println!("2. 배치 처리 (여러 고객번호)");
    println!("3. 보고서 내보내기 (마지막 조회 결과)");
    println!("4. 종료");
    println!("5. 납부 이력 조회 (등록번호)");
    println!("{}", "-".repeat(50));
}

/// Print a prompt and read one line of input.
///
/// Returns `None` at end of input. Invalid UTF-8 is replaced rather than rejected.
fn read_line<B: BufRead>(input: &mut B, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = Vec::new();
    let bytes = input.read_until(b'\n', &mut line).context("Failed to read input")?;
    if bytes == 0 {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
    }
}

fn print_session(session: &QuerySession) {
    println!("\n{}", "=".repeat(80));
    println!("{}", PROGRAM_TITLE.bold());
    println!("{}", "=".repeat(80));
    println!("고객번호: {}", session.customer_number);
    println!("출원인:   {}", session.applicant_name);
    println!("기준일:   {}", session.evaluated_on);
    println!("{}", "=".repeat(80));
    println!(
        "\n총 {}건의 등록특허가 발견되었습니다.\n",
        session.len().to_string().cyan().bold()
    );
    for (index, (record, status)) in session.patents.iter().enumerate() {
        print_patent(index + 1, record, status);
    }
    println!("{}", "=".repeat(80));
    println!("{}", "보고서를 내보내려면 메뉴에서 3번을 선택하세요.".dimmed());
}

fn print_patent(number: usize, record: &PatentRecord, status: &RenewalStatus) {
    println!("{}", format!("【{number}】 특허 정보").bold());
    println!("{}", "-".repeat(60));
    println!("  출원번호: {}", record.application_number);
    println!("  등록번호: {}", record.registration_number_label());
    println!("  출원인:   {}", record.applicant_name);
    println!("  등록날짜: {}", patent_fees::date_or_absent(record.registration_date));
    println!("  발명명칭: {}", record.short_title());
    println!("  청구항수: {}", record.claim_count);
    println!("  존속기간: {}", patent_fees::date_or_absent(record.expiration_date));
    println!("\n  {}", "연차료 정보".bold());
    println!("  - 해당 연차료 납부마감일: {}", status.due_date_label());
    println!("  - 해당연차수: {}", status.year_label());
    println!("  - 해당연차료: {}", status.fee_label());
    println!("  - 유효/불납: {}", colored_status(status.status));
    println!("  - 차기년도 납부의뢰: {}", status.next_year_label());
    println!("  - 추납기간: {}", status.grace_period_label());
    println!("  - 회복기간: {}", status.restoration_period_label());
    println!();
}

fn print_payment(lookup: &PaymentLookup) {
    println!("\n등록번호: {}", lookup.registration_number.to_string().cyan());
    let Some(payment) = &lookup.last_payment else {
        print_warning!("납부 이력이 없습니다: {}", lookup.registration_number);
        return;
    };
    print_last_payment(payment);
    if let (Some(year), Some(paid)) = (lookup.current_year, lookup.current_year_paid()) {
        if paid {
            println!("  {}", format!("{year}년차 연차료 납부 완료").green());
        } else {
            println!("  {}", format!("{year}년차 연차료 미납").yellow());
        }
    }
}

fn print_last_payment(payment: &LastPayment) {
    println!("  직전 납부연차: {}", payment.year_label());
    println!("  납부일자:     {}", payment.paid_on_label());
    println!("  납부금액:     {}", payment.amount_label());
}

fn colored_status(status: FeeStatus) -> ColoredString {
    let label = status.label();
    match status {
        FeeStatus::Valid => label.green(),
        FeeStatus::GracePeriod => label.yellow(),
        FeeStatus::RestorationPeriod => label.red(),
        FeeStatus::Expired => label.red().bold(),
        FeeStatus::Absent => label.dimmed(),
    }
}

#[cfg(test)]
#[path = "../../fake_registry.rs"]
mod fake_registry;

#[cfg(test)]
mod patent_shell_tests {
    use super::*;

    use std::io::{BufReader, Cursor, Read};
    use std::path::Path;

    use chrono::NaiveDate;
    use tempfile::{TempDir, tempdir};

    use super::fake_registry::FakeRegistry;

    /// Input that fails on every read.
    struct BrokenInput;

    impl Read for BrokenInput {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("terminal closed"))
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    fn patent(registration_number: Option<&str>, applicant_name: &str) -> PatentRecord {
        PatentRecord {
            application_number: "1020200054321".to_string(),
            registration_number: registration_number.map(str::to_string),
            applicant_name: applicant_name.to_string(),
            registration_date: Some(date(2022, 6, 16)),
            title: "무선 충전 장치".to_string(),
            claim_count: "9".to_string(),
            expiration_date: Some(date(2040, 4, 1)),
        }
    }

    fn registry() -> FakeRegistry {
        FakeRegistry::default()
            .with_patents("120140558200", vec![patent(Some("1022222220000"), "주식회사 가나")])
            .with_patents("420200012345", vec![patent(Some("1023333330000"), "다라 주식회사")])
            .with_patents("111111111111", vec![patent(None, "미등록 출원인")])
            .with_payment(
                "1022222220000",
                Some(LastPayment {
                    year: Some(4),
                    paid_on: Some(date(2025, 5, 30)),
                    amount: Some(95_000),
                }),
            )
            .with_payment("1023333330000", None)
    }

    fn config(output_dir: &Path, customer_numbers: &[&str]) -> Config {
        Config {
            api_key: "test-key".to_string(),
            base_url: "http://localhost".to_string(),
            output_dir: output_dir.to_path_buf(),
            evaluation_date: Some(date(2025, 6, 15)),
            customer_numbers: customer_numbers
                .iter()
                .map(|number| CustomerNumber::parse(number).expect("valid customer number"))
                .collect(),
            history_api_key: None,
            history_url: patent_fees::registry::REGISTER_HISTORY_URL.to_string(),
            verbose: false,
        }
    }

    fn shell(dir: &TempDir) -> PatentShell<FakeRegistry> {
        let mut shell = PatentShell::with_registry(config(dir.path(), &[]), registry(), None);
        shell.batch_delay = Duration::ZERO;
        shell
    }

    fn session_customer(shell: &PatentShell<FakeRegistry>) -> Option<&str> {
        shell.session.as_ref().map(|session| session.customer_number.as_str())
    }

    fn report_count(dir: &Path, extension: &str) -> usize {
        std::fs::read_dir(dir)
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == extension))
            .count()
    }

    #[test]
    fn menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::SingleQuery));
        assert_eq!(MenuChoice::parse(" 2 "), Some(MenuChoice::BatchQuery));
        assert_eq!(MenuChoice::parse("3"), Some(MenuChoice::Export));
        assert_eq!(MenuChoice::parse("4"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("5"), Some(MenuChoice::PaymentHistory));
        assert_eq!(MenuChoice::parse("6"), None);
        assert_eq!(MenuChoice::parse(""), None);
        assert_eq!(MenuChoice::parse("exit"), None);
    }

    #[test]
    fn read_line_trims_input() {
        let mut input = Cursor::new("  120140558200 \n");
        let line = read_line(&mut input, "").expect("read");
        assert_eq!(line.as_deref(), Some("120140558200"));
        assert_eq!(read_line(&mut input, "").expect("read"), None);
    }

    #[test]
    fn read_line_replaces_invalid_utf8() {
        let mut input = Cursor::new(b"1\xff\n".to_vec());
        let line = read_line(&mut input, "").expect("read");
        assert_eq!(line.as_deref(), Some("1\u{fffd}"));
    }

    #[tokio::test]
    async fn single_query_and_export_from_menu() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        let mut input = Cursor::new("1\n120140558200\n3\n4\n");

        shell.run_menu(&mut input).await;

        assert_eq!(session_customer(&shell), Some("120140558200"));
        assert_eq!(*shell.registry.calls.borrow(), ["120140558200"]);
        assert_eq!(shell.stats.exports, 1);
        assert_eq!(report_count(dir.path(), "csv"), 1);
        assert_eq!(report_count(dir.path(), "xlsx"), 1);
    }

    #[tokio::test]
    async fn end_of_input_exits_menu() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        let mut input = Cursor::new("");
        shell.run_menu(&mut input).await;
        assert!(shell.registry.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn invalid_menu_choice_continues() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        let mut input = Cursor::new("9\n1\n420200012345\n");
        shell.run_menu(&mut input).await;
        assert_eq!(session_customer(&shell), Some("420200012345"));
    }

    #[tokio::test]
    async fn invalid_customer_number_is_not_queried() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        shell.single_query("12345").await;
        shell.single_query("12014055820a").await;
        assert!(shell.registry.calls.borrow().is_empty());
        assert!(shell.session.is_none());
        assert_eq!(shell.stats.queries, 0);
    }

    #[tokio::test]
    async fn batch_skips_invalid_entries() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        shell.batch_query("120140558200, 12345, 420200012345").await;

        assert_eq!(*shell.registry.calls.borrow(), ["120140558200", "420200012345"]);
        assert_eq!(session_customer(&shell), Some("420200012345"));
        assert_eq!(shell.stats.queries, 2);
        assert_eq!(shell.stats.patents, 2);
    }

    #[tokio::test]
    async fn batch_without_valid_entries_does_nothing() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        shell.batch_query("abc, 123").await;
        shell.batch_query("   ").await;
        assert!(shell.registry.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn empty_and_failed_queries_keep_previous_session() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        shell.batch_query("120140558200,111111111111,999999999999").await;

        assert_eq!(session_customer(&shell), Some("120140558200"));
        assert_eq!(
            shell.stats,
            RunStats {
                queries: 3,
                empty: 1,
                failed: 1,
                patents: 1,
                exports: 0,
                payment_lookups: 0,
            }
        );
    }

    #[test]
    fn export_without_session_writes_nothing() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        let generated_at = date(2025, 6, 15).and_hms_opt(9, 0, 0).expect("valid time");
        assert!(shell.export(generated_at).is_none());
        assert_eq!(report_count(dir.path(), "csv"), 0);
    }

    #[tokio::test]
    async fn export_failure_keeps_session() {
        let dir = tempdir().expect("temp dir");
        let mut shell = PatentShell::with_registry(config(&dir.path().join("missing"), &[]), registry(), None);
        shell.single_query("120140558200").await;

        let generated_at = date(2025, 6, 15).and_hms_opt(9, 0, 0).expect("valid time");
        assert!(shell.export(generated_at).is_none());
        assert_eq!(session_customer(&shell), Some("120140558200"));
        assert_eq!(shell.stats.exports, 0);
    }

    #[tokio::test]
    async fn customer_numbers_from_arguments_are_exported() {
        let dir = tempdir().expect("temp dir");
        let mut shell = PatentShell::with_registry(
            config(dir.path(), &["120140558200", "420200012345"]),
            registry(),
            None,
        );
        shell.batch_delay = Duration::ZERO;

        shell.run_with_input(&mut Cursor::new("")).await;

        assert_eq!(report_count(dir.path(), "csv"), 1);
        let report = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .find(|name| name.ends_with(".csv"))
            .expect("csv report");
        assert!(report.starts_with("특허연차료현황_420200012345_"));
    }

    #[tokio::test]
    async fn evaluation_date_is_used_for_status() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        shell.single_query("120140558200").await;

        let session = shell.session.as_ref().expect("session");
        assert_eq!(session.evaluated_on, date(2025, 6, 15));
        let status = &session.patents[0].1;
        assert_eq!(status.year_label(), "4년차");
        assert_eq!(status.due_date_label(), "2025-06-16");
        assert_eq!(status.status, FeeStatus::Valid);
    }

    #[tokio::test]
    async fn invalid_utf8_input_continues() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        let mut input = Cursor::new(b"\xff\n1\n420200012345\n".to_vec());
        shell.run_menu(&mut input).await;
        assert_eq!(session_customer(&shell), Some("420200012345"));
    }

    #[tokio::test]
    async fn unreadable_input_ends_run_with_log() {
        let dir = tempdir().expect("temp dir");
        let log_path = dir.path().join("test.log");
        let logger = FileLogger::with_path(log_path.clone()).expect("create logger");
        let shell = PatentShell::with_registry(config(dir.path(), &[]), registry(), Some(logger));

        shell.run_with_input(&mut BufReader::new(BrokenInput)).await;

        let log = std::fs::read_to_string(log_path).expect("read log");
        assert!(log.contains("FAILED  INPUT stdin | Failed to read input: terminal closed"), "{log}");
        assert!(log.trim_end().ends_with("END"), "{log}");
    }

    #[tokio::test]
    async fn payment_history_from_menu() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);
        let mut input = Cursor::new("1\n120140558200\n5\n10-2222222-0000\n4\n");

        shell.run_menu(&mut input).await;

        assert_eq!(*shell.registry.calls.borrow(), ["120140558200", "1022222220000"]);
        assert_eq!(shell.stats.payment_lookups, 1);
        assert_eq!(shell.stats.failed, 0);
    }

    #[tokio::test]
    async fn payment_history_failures() {
        let dir = tempdir().expect("temp dir");
        let mut shell = shell(&dir);

        shell.payment_history("등록번호").await;
        assert!(shell.registry.calls.borrow().is_empty());
        assert_eq!(shell.stats.payment_lookups, 0);

        shell.payment_history("1023333330000").await;
        shell.payment_history("1029999990000").await;
        assert_eq!(*shell.registry.calls.borrow(), ["1023333330000", "1029999990000"]);
        assert_eq!(shell.stats.payment_lookups, 2);
        assert_eq!(shell.stats.failed, 1);
        assert!(shell.session.is_none());
    }
}
