#[test]
#[cfg(not(debug_assertions))]
fn link_tsan_stress_test() {
  // Run with RUSTFLAGS="-Z sanitizer=thread" cargo +nightly test --release link_tsan_stress_test
  let buffer = std::sync::Arc::new(fibre_link::LinkBuffer::new(2));
  let num_threads = 16;
  let items_per_thread = 100_000;
  let mut handles = vec![];

  for i in 0..num_threads {
    let buffer = buffer.clone();
    handles.push(std::thread::spawn(move || {
      for j in 0..items_per_thread {
        buffer.put((i, j)).unwrap();
        // A yield can help expose more interleavings.
        if j % 10 == 0 {
          std::thread::yield_now();
        }
      }
    }));
  }

  let consumer = {
    let buffer = buffer.clone();
    std::thread::spawn(move || {
      let mut count = 0;
      while buffer.pop().is_ok() {
        count += 1;
        if count % 10 == 0 {
          std::thread::yield_now();
        }
      }
      count
    })
  };

  for handle in handles {
    handle.join().unwrap();
  }
  buffer.close().unwrap();

  assert_eq!(consumer.join().unwrap(), num_threads * items_per_thread);
}
