extern crate regex;

use {
    crate::cli::logger,
    abnfgen::{self, PoolError, Program, ThreadPool},
    std::{
        error, fmt,
        fs::{self, File},
        io::Read,
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
    },
};

use self::regex::Regex;

const THREAD_POOL_QUEUE_LENGTH_PER_WORKER: usize = 2;

pub struct CheckCommand<'path> {
    pub program: Arc<Program>,
    pub rule: String,
    pub target_path: &'path Path,
    pub file_regex: Option<Regex>,
    pub thread_count: usize,
}

struct CheckInstance<'outer> {
    program: &'outer Arc<Program>,
    rule: &'outer Arc<String>,
    pool: &'outer ThreadPool<CheckPayload>,
    fn_regex: Option<&'outer Regex>,
    metrics: Arc<Mutex<CheckMetrics>>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct CheckMetrics {
    pub matched: usize,
    pub failed: usize,
    pub total: usize,
}

impl CheckMetrics {
    fn new() -> Self {
        CheckMetrics {
            matched: 0,
            failed: 0,
            total: 0,
        }
    }

    fn inc_matched(&mut self) {
        self.matched += 1;
    }

    fn inc_failed(&mut self) {
        self.failed += 1;
    }

    fn inc_total(&mut self) {
        self.total += 1;
    }
}

struct CheckPayload {
    program: Arc<Program>,
    rule: Arc<String>,
    file_path: PathBuf,
    metrics: Arc<Mutex<CheckMetrics>>,
}

impl CheckPayload {
    fn from(path: &Path, instance: &CheckInstance) -> Self {
        CheckPayload {
            program: instance.program.clone(),
            rule: instance.rule.clone(),
            file_path: PathBuf::from(path),
            metrics: instance.metrics.clone(),
        }
    }
}

/// Matches every file under the target against the rule, in parallel. A file passes only
/// if the rule consumes all of it.
pub fn check(cmd: CheckCommand) -> CheckMetrics {
    let pool: ThreadPool<CheckPayload> = ThreadPool::spawn(
        cmd.thread_count,
        cmd.thread_count * THREAD_POOL_QUEUE_LENGTH_PER_WORKER,
        |payload: CheckPayload| {
            let file_path_string = payload.file_path.to_string_lossy().to_string();

            let result = check_file(&payload.file_path, &payload.program, &payload.rule);

            let mut metrics = lock(&payload.metrics);
            match result {
                Ok(()) => {
                    logger::check_ok(&file_path_string);
                    metrics.inc_matched();
                }
                Err(err) => {
                    logger::check_err(&format!("{}", err));
                    metrics.inc_failed();
                }
            }
        },
    );

    let rule = Arc::new(cmd.rule);
    let metrics = Arc::new(Mutex::new(CheckMetrics::new()));
    {
        let mut instance = CheckInstance {
            program: &cmd.program,
            rule: &rule,
            pool: &pool,
            fn_regex: cmd.file_regex.as_ref(),
            metrics: metrics.clone(),
        };
        check_target(cmd.target_path, &mut instance);
    }

    if let Err(err) = pool.terminate_and_join() {
        logger::err(&format!("Failed to finish checking: {}", err));
    }

    let totals = *lock(&metrics);
    totals
}

fn lock(metrics: &Mutex<CheckMetrics>) -> std::sync::MutexGuard<CheckMetrics> {
    match metrics.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn check_target(target_path: &Path, instance: &mut CheckInstance) {
    let path_string = target_path.to_string_lossy().to_string();
    if target_path.is_dir() {
        let dir = match fs::read_dir(target_path) {
            Ok(dir) => dir,
            Err(err) => {
                logger::err(&format!(
                    "Could not read directory {}: {}",
                    path_string, err
                ));
                return;
            }
        };

        dir.for_each(|res| match res {
            Ok(dir_item) => check_target(&dir_item.path(), instance),
            Err(err) => logger::err(&format!(
                "An error occurred while searching directory {}: {}",
                path_string, err
            )),
        });
    } else {
        let file_name = match target_path.file_name() {
            Some(file_name) => file_name.to_string_lossy(),
            None => return,
        };

        let selected = match instance.fn_regex {
            Some(fn_regex) => fn_regex.is_match(&file_name),
            None => true,
        };

        if selected {
            lock(&instance.metrics).inc_total();

            let payload = CheckPayload::from(target_path, instance);
            if let Err(err) = instance.pool.enqueue(payload) {
                report_unchecked(&path_string, err, instance);
            }
        }
    }
}

fn report_unchecked(path_string: &str, err: PoolError, instance: &CheckInstance) {
    logger::err(&format!("Could not check {}: {}", path_string, err));
    lock(&instance.metrics).inc_failed();
}

fn check_file(target_path: &Path, program: &Program, rule: &str) -> Result<(), CheckingError> {
    let target_path_string = target_path.to_string_lossy().to_string();

    let mut text = String::new();
    match File::open(target_path) {
        Ok(mut target) => {
            if let Err(err) = target.read_to_string(&mut text) {
                return Err(CheckingError::FileErr(format!(
                    "Could not read target file \"{}\": {}",
                    target_path_string, err
                )));
            }
        }
        Err(err) => {
            return Err(CheckingError::FileErr(format!(
                "Could not find target file \"{}\": {}",
                target_path_string, err
            )))
        }
    }

    let matcher = match program.matcher(rule) {
        Some(matcher) => matcher,
        None => return Err(CheckingError::UnknownRule(rule.to_string())),
    };

    match matcher.run(&text, 0) {
        Some(end) if end == text.len() => Ok(()),
        Some(end) => {
            let (line, column) = abnfgen::position(&text, end);
            Err(CheckingError::PartialMatch {
                target: target_path_string,
                rule: rule.to_string(),
                line,
                column,
            })
        }
        None => Err(CheckingError::NoMatch {
            target: target_path_string,
            rule: rule.to_string(),
        }),
    }
}

#[derive(Debug, PartialEq)]
pub enum CheckingError {
    FileErr(String),
    UnknownRule(String),
    NoMatch {
        target: String,
        rule: String,
    },
    PartialMatch {
        target: String,
        rule: String,
        line: usize,
        column: usize,
    },
}

impl fmt::Display for CheckingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CheckingError::FileErr(ref err) => write!(f, "{}", err),
            CheckingError::UnknownRule(ref rule) => {
                write!(f, "Grammar has no rule named \"{}\"", rule)
            }
            CheckingError::NoMatch {
                ref target,
                ref rule,
            } => write!(f, "{} does not match rule \"{}\"", target, rule),
            CheckingError::PartialMatch {
                ref target,
                ref rule,
                line,
                column,
            } => write!(
                f,
                "{} only matches rule \"{}\" up to {}:{}",
                target, rule, line, column
            ),
        }
    }
}

impl error::Error for CheckingError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}
