//! Integration tests for topicbus
//!
//! Exercises the bus on the thread-pool scheduler, where deliveries really run
//! concurrently with the test body and with each other.

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc, Arc, Barrier, Mutex,
  },
  thread,
  time::Duration,
};

use futures::StreamExt;
use once_cell::sync::Lazy;
use tokio::runtime::Runtime;
use topicbus::prelude::*;

const WAIT: Duration = Duration::from_secs(5);

// drives the result channel waits of the sync tests
static TIMER: Lazy<Runtime> = Lazy::new(|| {
  tokio::runtime::Builder::new_multi_thread()
    .worker_threads(1)
    .enable_time()
    .build()
    .expect("failed to build the test runtime")
});

fn bus() -> EventBus { EventBus::new() }

fn ctx() -> Context { Context::background() }

fn once() -> Context { ctx().with_subscribe_options(SubscribeOptions::default().with_once(true)) }

fn reporting(strict: bool) -> (Context, ResultReceiver) {
  let (tx, rx) = result_channel();
  let ctx = ctx().with_publish_options(PublishOptions::default().with_strict(strict).with_result(tx));
  (ctx, rx)
}

fn outcome(rx: &mut ResultReceiver) -> Outcome {
  TIMER.block_on(async {
    tokio::time::timeout(WAIT, rx.next())
      .await
      .expect("timed out waiting for delivery")
      .expect("result channel closed")
  })
}

fn counter(hits: &Arc<AtomicUsize>) -> Callback {
  let hits = hits.clone();
  Callback::new(move |_, _| {
    hits.fetch_add(1, Ordering::SeqCst);
    Ok(())
  })
}

fn named(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str, fail: bool) -> Callback {
  let log = log.clone();
  Callback::new(move |_, _| {
    log.lock().unwrap().push(name);
    if fail { Err(name.into()) } else { Ok(()) }
  })
}

#[topicbus_macro::test]
fn test_publish_returns_before_delivery() {
  let bus = bus();
  let (release_tx, release_rx) = mpsc::channel::<()>();
  let release_rx = Mutex::new(release_rx);
  bus.subscribe(
    &ctx(),
    "slow",
    Callback::new(move |_, _| {
      let _ = release_rx.lock().unwrap().recv_timeout(WAIT);
      Ok(())
    }),
  );

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "slow", args![]).unwrap();
  // publish came back while the callback is still blocked
  release_tx.send(()).unwrap();
  assert!(outcome(&mut rx).is_ok());
}

#[topicbus_macro::test]
fn test_at_most_one_delivery_per_topic() {
  const PASSES: usize = 16;
  let bus = bus();
  let active = Arc::new(AtomicUsize::new(0));
  let peak = Arc::new(AtomicUsize::new(0));
  let calls = Arc::new(AtomicUsize::new(0));

  for _ in 0..3 {
    let (active, peak, calls) = (active.clone(), peak.clone(), calls.clone());
    bus.subscribe(
      &ctx(),
      "serial",
      Callback::new(move |_, _| {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
        active.fetch_sub(1, Ordering::SeqCst);
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
      }),
    );
  }

  let (ctx, mut rx) = reporting(false);
  for _ in 0..PASSES {
    bus.publish(&ctx, "serial", args![]).unwrap();
  }
  for _ in 0..PASSES {
    assert!(outcome(&mut rx).is_ok());
  }
  assert_eq!(peak.load(Ordering::SeqCst), 1);
  assert_eq!(calls.load(Ordering::SeqCst), PASSES * 3);
}

#[topicbus_macro::test]
fn test_different_topics_deliver_in_parallel() {
  let bus = EventBus::with_scheduler(ThreadPoolScheduler::new(2).unwrap());
  let (a_tx, a_rx) = mpsc::channel::<()>();
  let (b_tx, b_rx) = mpsc::channel::<()>();
  let (a_rx, b_rx) = (Mutex::new(a_rx), Mutex::new(b_rx));

  // each callback waits for the other topic's callback to have started
  bus.subscribe(
    &ctx(),
    "a",
    Callback::new(move |_, _| {
      a_tx.send(()).unwrap();
      b_rx.lock().unwrap().recv_timeout(WAIT).map_err(|e| e.into())
    }),
  );
  bus.subscribe(
    &ctx(),
    "b",
    Callback::new(move |_, _| {
      b_tx.send(()).unwrap();
      a_rx.lock().unwrap().recv_timeout(WAIT).map_err(|e| e.into())
    }),
  );

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "a", args![]).unwrap();
  bus.publish(&ctx, "b", args![]).unwrap();
  assert!(outcome(&mut rx).is_ok());
  assert!(outcome(&mut rx).is_ok());
}

#[topicbus_macro::test]
fn test_once_fires_exactly_once() {
  let bus = bus();
  let once_hits = Arc::new(AtomicUsize::new(0));
  let keep_hits = Arc::new(AtomicUsize::new(0));
  let once_cb = counter(&once_hits);
  bus.subscribe(&once(), "t", once_cb.clone());
  bus.subscribe(&ctx(), "t", counter(&keep_hits));

  let (ctx, mut rx) = reporting(false);
  for _ in 0..10 {
    bus.publish(&ctx, "t", args![]).unwrap();
  }
  for _ in 0..10 {
    assert!(outcome(&mut rx).is_ok());
  }
  assert_eq!(once_hits.load(Ordering::SeqCst), 1);
  assert_eq!(keep_hits.load(Ordering::SeqCst), 10);
  assert!(!bus.subscriber_ids("t").unwrap().contains(&once_cb.id()));
}

#[topicbus_macro::test]
fn test_last_once_subscriber_drops_topic() {
  let bus = bus();
  let hits = Arc::new(AtomicUsize::new(0));
  bus.subscribe(&once(), "t", counter(&hits));

  let (ctx, mut rx) = reporting(false);
  let mut accepted = 0;
  for _ in 0..10 {
    match bus.publish(&ctx, "t", args![]) {
      Ok(()) => accepted += 1,
      Err(err) => assert_eq!(err, BusError::TopicNotFound("t".into())),
    }
  }
  for _ in 0..accepted {
    assert!(outcome(&mut rx).is_ok());
  }
  assert!(accepted >= 1);
  assert_eq!(hits.load(Ordering::SeqCst), 1);
  assert!(!bus.contains_topic("t"));
  assert!(matches!(bus.publish(&ctx, "t", args![]), Err(BusError::TopicNotFound(_))));
}

#[topicbus_macro::test]
fn test_deferred_unsubscribe_keeps_length_until_sweep() {
  let bus = bus();
  let (entered_tx, entered_rx) = mpsc::channel::<()>();
  let (release_tx, release_rx) = mpsc::channel::<()>();
  let (entered_tx, release_rx) = (Mutex::new(entered_tx), Mutex::new(release_rx));

  let gate = Callback::new(move |_, _| {
    entered_tx.lock().unwrap().send(()).unwrap();
    release_rx.lock().unwrap().recv_timeout(WAIT).map_err(|e| e.into())
  });
  let hits = Arc::new(AtomicUsize::new(0));
  let victim = counter(&hits);
  let bystander = counter(&hits);
  bus.subscribe(&ctx(), "t", gate.clone());
  bus.subscribe(&ctx(), "t", victim.clone());
  bus.subscribe(&ctx(), "t", bystander.clone());

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "t", args![]).unwrap();
  entered_rx.recv_timeout(WAIT).unwrap();

  // delivery is mid-pass: the unsubscribe returns at once and only flags
  bus.unsubscribe("t", &[victim.id()]);
  assert_eq!(bus.subscriber_count("t"), Some(3));

  release_tx.send(()).unwrap();
  assert!(outcome(&mut rx).is_ok());
  assert_eq!(bus.subscriber_ids("t"), Some(vec![gate.id(), bystander.id()]));
  // the victim was not reached when flagged, so it still fired in that pass
  assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[topicbus_macro::test]
fn test_deferred_unsubscribe_all_drops_topic_after_pass() {
  let bus = bus();
  let (entered_tx, entered_rx) = mpsc::channel::<()>();
  let (release_tx, release_rx) = mpsc::channel::<()>();
  let (entered_tx, release_rx) = (Mutex::new(entered_tx), Mutex::new(release_rx));
  bus.subscribe(
    &ctx(),
    "t",
    Callback::new(move |_, _| {
      entered_tx.lock().unwrap().send(()).unwrap();
      release_rx.lock().unwrap().recv_timeout(WAIT).map_err(|e| e.into())
    }),
  );

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "t", args![]).unwrap();
  entered_rx.recv_timeout(WAIT).unwrap();

  bus.unsubscribe_all("t");
  assert!(bus.contains_topic("t"));

  release_tx.send(()).unwrap();
  assert!(outcome(&mut rx).is_ok());
  assert!(!bus.contains_topic("t"));
}

#[topicbus_macro::test]
fn test_concurrent_unsubscribes_tear_topic_down() {
  for _ in 0..500 {
    let bus = bus();
    let hits = Arc::new(AtomicUsize::new(0));
    let (a, b) = (counter(&hits), counter(&hits));
    bus.subscribe(&ctx(), "t", a.clone());
    bus.subscribe(&ctx(), "t", b.clone());

    let start = Arc::new(Barrier::new(2));
    let workers: Vec<_> = [a.id(), b.id()]
      .into_iter()
      .map(|id| {
        let (bus, start) = (bus.clone(), start.clone());
        thread::spawn(move || {
          start.wait();
          bus.unsubscribe("t", &[id]);
        })
      })
      .collect();
    for worker in workers {
      worker.join().unwrap();
    }

    assert!(!bus.contains_topic("t"));
    assert!(matches!(bus.publish(&ctx(), "t", args![]), Err(BusError::TopicNotFound(_))));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
  }
}

#[topicbus_macro::test]
fn test_subscriber_added_mid_pass_waits_for_next_pass() {
  let bus = bus();
  let hits = Arc::new(AtomicUsize::new(0));
  let late = counter(&hits);
  let gate = {
    let (bus, late) = (bus.clone(), late.clone());
    Callback::new(move |_, _| {
      bus.subscribe(&Context::background(), "t", late.clone());
      Ok(())
    })
  };
  bus.subscribe(&ctx(), "t", gate);

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "t", args![]).unwrap();
  assert!(outcome(&mut rx).is_ok());
  assert_eq!(hits.load(Ordering::SeqCst), 0);
  assert_eq!(bus.subscriber_count("t"), Some(2));

  bus.publish(&ctx, "t", args![]).unwrap();
  assert!(outcome(&mut rx).is_ok());
  assert_eq!(hits.load(Ordering::SeqCst), 1);

  // the gate holds a bus handle; drop it to release the topic
  bus.unsubscribe_all("t");
}

#[topicbus_macro::test]
fn test_replace_not_duplicate() {
  let bus = bus();
  let log = Arc::new(Mutex::new(vec![]));
  let a = named(&log, "a", false);
  let b = named(&log, "b", false);
  bus.subscribe(&ctx(), "t", a.clone());
  bus.subscribe(&ctx(), "t", b.clone());
  bus.subscribe(&once(), "t", a.clone());

  assert_eq!(bus.subscriber_ids("t"), Some(vec![a.id(), b.id()]));

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "t", args![]).unwrap();
  assert!(outcome(&mut rx).is_ok());
  assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
  assert_eq!(bus.subscriber_ids("t"), Some(vec![b.id()]));
}

#[topicbus_macro::test]
fn test_strict_short_circuit() {
  let bus = bus();
  let log = Arc::new(Mutex::new(vec![]));
  bus.subscribe(&ctx(), "t", named(&log, "A", false));
  bus.subscribe(&ctx(), "t", named(&log, "B", true));
  bus.subscribe(&ctx(), "t", named(&log, "C", false));

  let (ctx, mut rx) = reporting(true);
  bus.publish(&ctx, "t", args![]).unwrap();
  let err = outcome(&mut rx).unwrap_err();

  assert!(matches!(err, DeliveryError::Callback(_)));
  assert!(err.as_aggregate().is_none());
  assert_eq!(err.to_string(), "B");
  assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
}

#[topicbus_macro::test]
fn test_strict_without_errors_reports_ok() {
  let bus = bus();
  let log = Arc::new(Mutex::new(vec![]));
  bus.subscribe(&ctx(), "t", named(&log, "A", false));
  bus.subscribe(&ctx(), "t", named(&log, "B", false));

  let (ctx, mut rx) = reporting(true);
  bus.publish(&ctx, "t", args![]).unwrap();
  assert!(outcome(&mut rx).is_ok());
  assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
}

#[topicbus_macro::test]
fn test_lenient_aggregation() {
  let bus = bus();
  let log = Arc::new(Mutex::new(vec![]));
  bus.subscribe(&ctx(), "t", named(&log, "x", true));
  bus.subscribe(&ctx(), "t", named(&log, "ok", false));
  bus.subscribe(&ctx(), "t", named(&log, "y", true));

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "t", args![]).unwrap();
  let err = outcome(&mut rx).unwrap_err();

  assert_eq!(err.to_string(), "[x,y]");
  assert_eq!(err.as_aggregate().map(Errors::len), Some(2));
  assert_eq!(*log.lock().unwrap(), vec!["x", "ok", "y"]);
  // failing subscribers stay subscribed
  assert_eq!(bus.subscriber_count("t"), Some(3));
}

#[topicbus_macro::test]
fn test_fault_containment() {
  let bus = bus();
  let hits = Arc::new(AtomicUsize::new(0));
  bus.subscribe(&ctx(), "t", Callback::new(|_, _| panic!("boom")));
  bus.subscribe(&ctx(), "t", counter(&hits));

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "t", args![]).unwrap();
  let err = outcome(&mut rx).unwrap_err();

  let errors = err.as_aggregate().unwrap();
  assert_eq!(errors.len(), 1);
  assert!(errors.iter().all(DeliveryError::is_fault));
  assert_eq!(err.to_string(), "[boom]");
  assert_eq!(hits.load(Ordering::SeqCst), 1);

  // the pool survives the panic and the topic still delivers
  bus.publish(&ctx, "t", args![]).unwrap();
  assert!(outcome(&mut rx).is_err());
  assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[topicbus_macro::test]
fn test_strict_fault_stops_pass() {
  let bus = bus();
  let hits = Arc::new(AtomicUsize::new(0));
  bus.subscribe(&ctx(), "t", Callback::new(|_, _| panic!("boom")));
  bus.subscribe(&ctx(), "t", counter(&hits));

  let (ctx, mut rx) = reporting(true);
  bus.publish(&ctx, "t", args![]).unwrap();
  let err = outcome(&mut rx).unwrap_err();
  assert!(err.is_fault());
  assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[topicbus_macro::test]
fn test_strict_abort_keeps_unreached_once_subscriber() {
  let bus = bus();
  let log = Arc::new(Mutex::new(vec![]));
  bus.subscribe(&ctx(), "t", named(&log, "fail", true));
  bus.subscribe(&once(), "t", named(&log, "once", false));

  let (strict, mut strict_rx) = reporting(true);
  bus.publish(&strict, "t", args![]).unwrap();
  assert!(outcome(&mut strict_rx).is_err());
  assert_eq!(bus.subscriber_count("t"), Some(2));

  let (lenient, mut lenient_rx) = reporting(false);
  bus.publish(&lenient, "t", args![]).unwrap();
  assert!(outcome(&mut lenient_rx).is_err());
  assert_eq!(bus.subscriber_count("t"), Some(1));
  assert_eq!(*log.lock().unwrap(), vec!["fail", "fail", "once"]);
}

#[topicbus_macro::test]
fn test_empty_topic_teardown() {
  let bus = bus();
  let a = counter(&Arc::new(AtomicUsize::new(0)));
  bus.subscribe(&ctx(), "t", a.clone());
  bus.unsubscribe("t", &[a.id()]);
  assert!(matches!(bus.publish(&ctx(), "t", args![]), Err(BusError::TopicNotFound(_))));
  assert_eq!(bus.topic_count(), 0);
}

#[topicbus_macro::test]
fn test_context_data_reaches_callbacks() {
  let bus = bus();
  bus.subscribe(
    &ctx(),
    "t",
    Callback::new(|ctx, args: &Args| {
      let data = ctx.data::<i8>().ok_or("missing data")?;
      let count = arg::<Arc<AtomicUsize>>(args, 0).ok_or("missing counter")?;
      count.fetch_add(*data as usize, Ordering::SeqCst);
      Ok(())
    }),
  );

  let count = Arc::new(AtomicUsize::new(0));
  let (tx, mut rx) = result_channel();
  let ctx = ctx()
    .with_data(3_i8)
    .with_publish_options(PublishOptions::default().with_result(tx));
  bus.publish(&ctx, "t", args![count.clone()]).unwrap();
  assert!(outcome(&mut rx).is_ok());
  assert_eq!(count.load(Ordering::SeqCst), 3);

  // without data the callback reports its own error
  let (bare, mut bare_rx) = reporting(false);
  bus.publish(&bare, "t", args![count.clone()]).unwrap();
  assert_eq!(outcome(&mut bare_rx).unwrap_err().to_string(), "[missing data]");
}

#[topicbus_macro::test]
fn test_subscribe_unsubscribe_race_with_publish() {
  let bus = bus();
  let hits = Arc::new(AtomicUsize::new(0));
  let anchor = counter(&hits);
  bus.subscribe(&ctx(), "t", anchor.clone());

  let (ctx, mut rx) = reporting(false);
  let churn = {
    let bus = bus.clone();
    let hits = hits.clone();
    thread::spawn(move || {
      for _ in 0..200 {
        let cb = counter(&hits);
        bus.subscribe(&Context::background(), "t", cb.clone());
        bus.unsubscribe("t", &[cb.id()]);
      }
    })
  };
  for _ in 0..50 {
    bus.publish(&ctx, "t", args![]).unwrap();
  }
  churn.join().unwrap();
  for _ in 0..50 {
    assert!(outcome(&mut rx).is_ok());
  }

  // only the anchor survives, whatever the interleaving was
  assert_eq!(bus.subscriber_ids("t"), Some(vec![anchor.id()]));
}

#[topicbus_macro::test(shared)]
async fn test_result_channel_on_tokio() {
  let bus = bus();
  let hits = Arc::new(AtomicUsize::new(0));
  bus.subscribe(&ctx(), "t", counter(&hits));

  let (ctx, mut rx) = reporting(false);
  bus.publish(&ctx, "t", args![]).unwrap();
  let outcome = tokio::time::timeout(WAIT, rx.next()).await.unwrap().unwrap();
  assert!(outcome.is_ok());
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[topicbus_macro::test]
fn test_fire_and_forget() {
  let bus = bus();
  let (tx, rx) = mpsc::channel::<()>();
  let tx = Mutex::new(tx);
  bus.subscribe(
    &ctx(),
    "t",
    Callback::new(move |_, _| {
      let _ = tx.lock().unwrap().send(());
      Ok(())
    }),
  );
  bus.publish(&ctx(), "t", args![]).unwrap();
  rx.recv_timeout(WAIT).unwrap();
}
