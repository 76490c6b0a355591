pub const SCHEMA_V1: &str = r#"
BEGIN;

-- Profile:
-- единственная строка, id закреплён за 1 (соглашение, не constraint)
CREATE TABLE
    IF NOT EXISTS profile (
        id INTEGER PRIMARY KEY,
        lastName TEXT,
        firstName TEXT,
        middleName TEXT,
        birthDate TEXT,
        groupNumber TEXT
    );

-- ScheduleItem:
-- time хранится строкой "HH:MM-HH:MM", createdAt — ISO-8601
CREATE TABLE
    IF NOT EXISTS schedule_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        time TEXT NOT NULL,
        subject TEXT NOT NULL,
        teacherName TEXT NOT NULL,
        dayOfWeek TEXT NOT NULL,
        createdAt TEXT NOT NULL
    );

------------------------------------------------------------------
-- Устанавливаем user_version = 1
PRAGMA user_version = 1;

COMMIT;
"#;

// v2: тип занятия появился после первого релиза схемы,
// колонка добавляется отдельным шагом (только ADD COLUMN, ничего не ломаем)
pub const SCHEMA_V2: &str = r#"
BEGIN;

ALTER TABLE schedule_items ADD COLUMN lessonType TEXT;

PRAGMA user_version = 2;

COMMIT;
"#;
