#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schooldesk::db;
use schooldesk::models::{ActionState, Principal, ResultPayload, Role};
use schooldesk::services::ResultActions;
use sqlx::SqlitePool;

const SEED: &str = r#"
INSERT INTO teachers (id, name, surname, email) VALUES
    ('t1', 'Ada', 'Byron', 'ada@school.test'),
    ('t2', 'Alan', 'Turing', 'alan@school.test');

INSERT INTO grades (id, level) VALUES (1, 1), (2, 2);

INSERT INTO subjects (id, name) VALUES (1, 'Math'), (2, 'English');

INSERT INTO classes (id, name, capacity, supervisor_id, grade_id) VALUES
    (1, '1A', 20, 't1', 1),
    (2, '2B', 25, NULL, 2);

INSERT INTO students (id, name, surname, email, class_id, grade_id) VALUES
    ('s1', 'Ann', 'Lee', 'ann@school.test', 1, 1),
    ('s2', 'Bob', 'Ray', 'bob@school.test', 2, 2),
    ('s3', 'Cid', 'Orr', NULL, 1, 1);

INSERT INTO lessons (id, name, day, start_time, end_time, subject_id, class_id, teacher_id) VALUES
    (1, 'Math 1A', 'MONDAY', '2026-10-19 08:00:00', '2026-10-19 09:00:00', 1, 1, 't1'),
    (2, 'English 2B', 'WEDNESDAY', '2026-10-21 10:00:00', '2026-10-21 11:30:00', 2, 2, 't2');

INSERT INTO exams (id, title, start_time, end_time, lesson_id) VALUES
    (10, 'Math midterm', '2026-10-19 08:00:00', '2026-10-19 09:00:00', 1),
    (11, 'English quiz', '2026-10-21 10:00:00', '2026-10-21 10:30:00', 2);

INSERT INTO assignments (id, title, start_date, due_date, lesson_id) VALUES
    (20, 'Algebra homework', '2026-10-19 08:00:00', '2026-10-26 08:00:00', 1),
    (21, 'Essay', '2026-10-21 10:00:00', '2026-10-28 10:00:00', 2);

INSERT INTO events (id, title, description, start_time, end_time, class_id) VALUES
    (1, 'Sports day', 'Whole school', '2026-10-18 09:00:00', '2026-10-18 15:00:00', NULL),
    (2, 'Parents evening', '1A only', '2026-10-20 18:00:00', '2026-10-20 20:00:00', 1);

INSERT INTO announcements (id, title, description, date, class_id) VALUES
    (1, 'Welcome back', '', '2026-10-01', NULL),
    (2, '1A trip', '', '2026-10-10', 1),
    (3, '2B trip', '', '2026-10-12', 2),
    (4, '1A test moved', '', '2026-10-15', 1),
    (5, 'Library closed', '', '2026-10-16', NULL);
"#;

pub async fn setup() -> SqlitePool {
    db::connect_in_memory()
        .await
        .expect("Failed to create database")
}

pub async fn setup_seeded() -> SqlitePool {
    let pool = setup().await;
    sqlx::raw_sql(SEED)
        .execute(&pool)
        .await
        .expect("Failed to seed database");
    pool
}

pub fn principal(id: &str, email: Option<&str>, role: Option<Role>) -> Principal {
    Principal::new(id, email.map(str::to_string), role)
}

/// Records every payload it is handed and answers with a fixed state.
pub struct RecordingActions {
    pub answer: ActionState,
    pub created: Mutex<Vec<ResultPayload>>,
    pub updated: Mutex<Vec<ResultPayload>>,
}

impl RecordingActions {
    pub fn new(answer: ActionState) -> Arc<Self> {
        Arc::new(Self {
            answer,
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
        })
    }

    pub fn created(&self) -> Vec<ResultPayload> {
        self.created.lock().expect("lock poisoned").clone()
    }

    pub fn updated(&self) -> Vec<ResultPayload> {
        self.updated.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ResultActions for RecordingActions {
    async fn create(&self, payload: ResultPayload) -> ActionState {
        self.created.lock().expect("lock poisoned").push(payload);
        self.answer
    }

    async fn update(&self, payload: ResultPayload) -> ActionState {
        self.updated.lock().expect("lock poisoned").push(payload);
        self.answer
    }
}
