use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc
};

use log::{info, warn};
use typebus::{EventBus, EventBusConfig, Subscription};

struct FirstEvent {
    message: String,
}

struct SecondEvent {
    id: u32,
    message: String,
}

struct ThirdEvent {
    value: f64,
}

fn on_first_event(evt: &FirstEvent) {
    info!("event: {}", evt.message);
}

#[derive(Default)]
struct CallbackObject {
    event_count: AtomicUsize,
}

impl CallbackObject {
    fn on_event_fired(&self, _: &FirstEvent) {
        self.event_count.fetch_add(1, Ordering::Relaxed);
    }

    fn on_third_event(&self) {
        info!("callback object saw a third event");
    }

    fn event_count(&self) -> usize {
        self.event_count.load(Ordering::Relaxed)
    }
}

// Keeps its handler registered exactly as long as it lives.
struct InternalRegistration {
    _sub: Subscription,
}

impl InternalRegistration {
    fn new(bus: &EventBus) -> Self {
        Self {
            _sub: bus.subscribe::<FirstEvent, _>(|evt: &FirstEvent| {
                info!("internal registration: {}", evt.message);
            }),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let bus = EventBus::with_config(EventBusConfig::new().with_name("demo"));

    let _first = bus.subscribe::<FirstEvent, _>(on_first_event);
    let mut third = bus.subscribe::<ThirdEvent, _>(|evt: &ThirdEvent| {
        info!("third event handler: {}", evt.value);
    });
    let _third_notify = bus.subscribe::<ThirdEvent, _>(|| {
        info!("a third event was fired");
    });

    let internal = InternalRegistration::new(&bus);

    bus.publish(FirstEvent { message: "hello from first event".into() });
    bus.publish(ThirdEvent { value: 13.0 });
    bus.unregister(&mut third);
    bus.publish(ThirdEvent { value: 13.0 });

    let mut second_a = bus.subscribe::<SecondEvent, _>(|evt: &SecondEvent| {
        info!("first second-event handler says: {}", evt.message);
    });
    let _second_b = bus.subscribe::<SecondEvent, _>(|evt: &SecondEvent| {
        info!("second second-event handler says: {} {}", evt.id, evt.message);
    });

    let callback = Arc::new(CallbackObject::default());
    let _cb_first = bus.subscribe_method::<FirstEvent, _, _>(&callback, CallbackObject::on_event_fired);
    let _cb_third = bus.subscribe_method::<ThirdEvent, _, _>(&callback, CallbackObject::on_third_event);

    bus.publish(FirstEvent { message: "another first event".into() });

    info!("firing second event");
    let second = SecondEvent { id: 2, message: "hello there from second event".into() };
    bus.publish_ref(&second);
    second_a.unsubscribe();
    info!("firing second and third event");
    bus.publish_ref(&second);
    bus.publish(ThirdEvent { value: 234.0 });

    drop(internal);

    let publishers = num_cpus::get().max(2);
    let counted = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counted);
    let _counter = bus.subscribe::<u64, _>(move |n: &u64| {
        c.fetch_add(*n as usize, Ordering::Relaxed);
    });

    let handles: Vec<_> = (0..publishers)
        .map(|_| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    bus.publish(1u64);
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            warn!("publisher thread panicked");
        }
    }

    info!("{} publishers delivered {} events", publishers, counted.load(Ordering::Relaxed));
    info!("callback count: {}", callback.event_count());
    info!("handler count: {}", bus.count());
    info!("removing handlers...");
    bus.clear_all();
    info!("handler count: {}", bus.count());
}
