//! 会话流程集成测试
//!
//! 使用暂停的时钟驱动防抖、调度和结果送达的完整事件循环

use std::time::Duration;

use autotranslate::translation::{
    DispatcherConfig, FailureKind, LanguageRole, OutcomeResult, RequestSettings, SessionEvent,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{keep_superseded, play_script, SinkEvent, Step, TestEnvironment};

/// 连续的选区变化只触发一次翻译，使用最后的选区
#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_translates_final_selection() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![
            Step::Select("H"),
            Step::Wait(200),
            Step::Select("He"),
            Step::Wait(200),
            Step::Select("Hel"),
            Step::Wait(200),
            Step::Select("Hell"),
            Step::Wait(200),
            Step::Select("Hello"),
        ],
    );

    let session = session.run(events).await;
    let sink = session.dispatcher().sink();

    assert_eq!(sink.pending(), vec![1]);
    assert_eq!(sink.result_texts(), vec!["Alpha:Hello"]);
    assert_eq!(env.alpha_calls.lock().unwrap().len(), 1);
    assert_eq!(session.debouncer().fire_count(), 1);
    println!("✅ 5 changes coalesced into a single request");
}

/// 选区在触发时才读取，读到的是当时的文本
#[tokio::test(start_paused = true)]
async fn test_selection_is_read_when_timer_fires() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());
    let late_writer = selection.clone();

    let events = play_script(selection, vec![Step::Select("first")]);
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        // 不发送变化事件，只改写选区
        late_writer.set("  rewritten  ");
    });

    let session = session.run(events).await;
    assert_eq!(session.dispatcher().sink().result_texts(), vec!["Alpha:rewritten"]);
}

/// 空白选区不产生请求，界面也不会收到任何通知
#[tokio::test(start_paused = true)]
async fn test_blank_selection_is_skipped() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![Step::Select("   \n\t"), Step::Wait(1500), Step::Select("")],
    );

    let session = session.run(events).await;

    assert!(session.dispatcher().sink().events.is_empty());
    assert!(env.alpha_calls.lock().unwrap().is_empty());
    assert_eq!(session.dispatcher().get_stats().snapshot().issued, 0);
}

/// 与上一次接受的文本相同的选区不会重新翻译
#[tokio::test(start_paused = true)]
async fn test_unchanged_text_is_not_retranslated() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![
            Step::Select("hello"),
            Step::Wait(1500),
            Step::Select(" hello "),
            Step::Wait(1500),
            Step::Select("world"),
            Step::Wait(1500),
            Step::Select("hello"),
        ],
    );

    let session = session.run(events).await;
    let sink = session.dispatcher().sink();

    assert_eq!(sink.pending(), vec![1, 2, 3]);
    assert_eq!(
        sink.result_texts(),
        vec!["Alpha:hello", "Alpha:world", "Alpha:hello"]
    );
    assert_eq!(session.dispatcher().get_stats().snapshot().duplicates, 1);
}

/// 旧请求晚于新请求完成时，旧结果被丢弃
#[tokio::test(start_paused = true)]
async fn test_late_outcome_never_overwrites_newer_one() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(keep_superseded());

    let events = play_script(
        selection,
        vec![Step::Select("slow@3000"), Step::Wait(1100), Step::Select("fast@100")],
    );

    let session = session.run(events).await;
    let sink = session.dispatcher().sink();

    assert_eq!(sink.pending(), vec![1, 2]);
    assert_eq!(sink.result_sequences(), vec![2]);
    assert_eq!(sink.result_texts(), vec!["Alpha:fast"]);

    let stats = session.dispatcher().get_stats().snapshot();
    assert_eq!(stats.superseded, 1);
    assert_eq!(stats.cancelled, 0);
    // 两个请求都真正执行过
    assert_eq!(env.alpha_calls.lock().unwrap().len(), 2);
}

/// 默认配置下，新结果送达后仍在执行的旧请求被中止
#[tokio::test(start_paused = true)]
async fn test_older_worker_is_cancelled_after_newer_delivery() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![Step::Select("slow@3000"), Step::Wait(1100), Step::Select("fast@100")],
    );

    let session = session.run(events).await;
    let stats = session.dispatcher().get_stats().snapshot();

    assert_eq!(session.dispatcher().sink().result_sequences(), vec![2]);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.superseded, 0);
    assert!(!session.dispatcher().has_in_flight());
}

/// 输入结束时只剩被中止的旧请求，事件循环仍然退出
#[tokio::test(start_paused = true)]
async fn test_run_returns_after_input_ends_with_aborted_worker() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![Step::Select("stale@3000"), Step::Wait(1100), Step::Select("fresh@100")],
    );

    let finished = tokio::time::timeout(Duration::from_secs(600), session.run(events)).await;
    let session = finished.expect("session loop should return once input is drained");

    assert_eq!(session.dispatcher().sink().result_texts(), vec!["Alpha:fresh"]);
    assert_eq!(session.dispatcher().in_flight_count(), 0);
    assert_eq!(session.dispatcher().get_stats().snapshot().cancelled, 1);
}

/// 送达顺序单调递增，且每个结果之前都先有对应的等待通知
#[tokio::test(start_paused = true)]
async fn test_delivery_is_monotonic_under_overlap() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(keep_superseded());

    let events = play_script(
        selection,
        vec![
            Step::Select("a@2500"),
            Step::Wait(1100),
            Step::Select("b@300"),
            Step::Wait(1100),
            Step::Select("c@4000"),
            Step::Wait(1100),
            Step::Select("d@100"),
            Step::Wait(1100),
            Step::Select("e@1200"),
        ],
    );

    let session = session.run(events).await;
    let sink = session.dispatcher().sink();

    let delivered = sink.result_sequences();
    assert!(!delivered.is_empty());
    assert!(delivered.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", delivered);
    assert_eq!(delivered.last(), Some(&5));

    for (index, event) in sink.events.iter().enumerate() {
        if let SinkEvent::Result(outcome) = event {
            assert!(sink.events[..index].contains(&SinkEvent::Pending(outcome.sequence)));
        }
    }

    let stats = session.dispatcher().get_stats().snapshot();
    assert_eq!(stats.issued, 5);
    assert_eq!(stats.delivered + stats.superseded, 5);
}

/// 运行中切换后端和语言只影响之后的请求
#[tokio::test(start_paused = true)]
async fn test_settings_change_applies_to_next_request() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let beta = RequestSettings::new("Beta", "http://unused.invalid")
        .with_language(LanguageRole::Source, Some("Spanish"));

    let events = play_script(
        selection,
        vec![
            Step::Select("uno"),
            Step::Wait(1500),
            Step::Send(SessionEvent::SettingsChanged(beta)),
            Step::Select("dos"),
        ],
    );

    let session = session.run(events).await;

    assert_eq!(
        session.dispatcher().sink().result_texts(),
        vec!["Alpha:uno", "Beta:dos"]
    );
    let beta_calls = env.beta_calls.lock().unwrap();
    assert_eq!(beta_calls.len(), 1);
    assert_eq!(beta_calls[0].source_lang.as_deref(), Some("Spanish"));
    assert_eq!(beta_calls[0].target_lang, None);
}

/// 切换后端后选中同一段文本仍被视为重复
#[tokio::test(start_paused = true)]
async fn test_same_text_after_provider_switch_is_suppressed() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![
            Step::Select("same"),
            Step::Wait(1500),
            Step::Send(SessionEvent::SettingsChanged(RequestSettings::new("Beta", ""))),
            Step::Select("same"),
        ],
    );

    let session = session.run(events).await;

    assert_eq!(session.dispatcher().sink().pending(), vec![1]);
    assert!(env.beta_calls.lock().unwrap().is_empty());
}

/// 未知后端只让当次请求失败，会话继续工作
#[tokio::test(start_paused = true)]
async fn test_unknown_provider_fails_single_request() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![
            Step::Send(SessionEvent::SettingsChanged(RequestSettings::new("Nonexistent", ""))),
            Step::Select("text"),
            Step::Wait(1500),
            Step::Send(SessionEvent::SettingsChanged(RequestSettings::new("Alpha", ""))),
            Step::Select("more"),
        ],
    );

    let session = session.run(events).await;
    let results = session.dispatcher().sink().results();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].failure_kind(), Some(FailureKind::UnknownProvider));
    assert!(results[0].display_text().starts_with("Error: "));
    assert!(results[0].display_text().contains("Nonexistent"));
    assert_eq!(results[1].display_text(), "Alpha:more");
}

/// 重置后旧请求的结果不会送达，序号重新开始
#[tokio::test(start_paused = true)]
async fn test_reset_discards_in_flight_work() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(keep_superseded());

    let events = play_script(
        selection,
        vec![
            Step::Select("old@5000"),
            Step::Wait(1500),
            Step::Send(SessionEvent::Reset),
            Step::Select("new"),
        ],
    );

    let session = session.run(events).await;
    let sink = session.dispatcher().sink();

    assert_eq!(sink.pending(), vec![1, 1]);
    assert_eq!(sink.result_texts(), vec!["Alpha:new"]);
    assert_eq!(sink.result_sequences(), vec![1]);
}

/// 重置会取消尚未到期的防抖计时
#[tokio::test(start_paused = true)]
async fn test_reset_cancels_pending_timer() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![Step::Select("never"), Step::Wait(500), Step::Send(SessionEvent::Reset)],
    );

    let session = session.run(events).await;
    assert!(session.dispatcher().sink().events.is_empty());
    assert_eq!(session.debouncer().fire_count(), 0);
}

/// 关闭后不再有任何回调
#[tokio::test(start_paused = true)]
async fn test_close_stops_everything() {
    let env = TestEnvironment::default();
    let (selection, session) = env.session(DispatcherConfig::default());

    let events = play_script(
        selection,
        vec![
            Step::Select("running@500"),
            Step::Wait(1100),
            Step::Select("queued"),
            Step::Send(SessionEvent::Close),
        ],
    );

    let session = session.run(events).await;
    let sink = session.dispatcher().sink();

    assert_eq!(sink.pending(), vec![1]);
    assert!(sink.results().is_empty());
    assert!(!session.debouncer().is_pending());
    assert!(!session.dispatcher().has_in_flight());
}

/// 原样返回的后端：送达的译文与提交的稳定文本完全一致
#[tokio::test(start_paused = true)]
async fn test_echo_provider_round_trips_selection() {
    let env = TestEnvironment::default();
    let (selection, mut session) = env.session(DispatcherConfig::default());
    session.handle_event(SessionEvent::SettingsChanged(RequestSettings::new(
        "Echo",
        "http://unused.invalid",
    )));

    let events = play_script(selection, vec![Step::Select("  Hola, mundo: 42 \n")]);
    let session = session.run(events).await;
    let results = session.dispatcher().sink().results();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].sequence, 1);
    assert_eq!(
        results[0].result,
        OutcomeResult::Translated("Hola, mundo: 42".to_string())
    );
    assert_eq!(
        session.dispatcher().state().last_accepted_text.as_deref(),
        Some("Hola, mundo: 42")
    );
}
