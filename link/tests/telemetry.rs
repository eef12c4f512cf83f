use fibre_link::telemetry;
use fibre_link::LinkBuffer;
use serial_test::serial;

#[test]
#[serial]
fn telemetry_counts_puts_and_growth() {
  telemetry::clear_telemetry();

  let buffer = LinkBuffer::new(2);
  for i in 0..5u32 {
    buffer.put(i).unwrap();
  }
  while buffer.try_pop().is_ok() {}

  assert_eq!(telemetry::counter_value("LinkBuffer::put", "Accepted"), 5);
  // 2 -> 4 -> 8 slots.
  assert_eq!(telemetry::counter_value("LinkBuffer::put", "Grow"), 2);
  assert_eq!(telemetry::counter_value("LinkBuffer::try_pop", "Popped"), 5);

  let grow_events: Vec<_> = telemetry::events()
    .into_iter()
    .filter(|e| e.event_type == "Grow")
    .map(|e| e.value)
    .collect();
  assert_eq!(grow_events, vec![Some(4), Some(8)]);
}

#[test]
#[serial]
fn telemetry_records_close_and_rejections() {
  telemetry::clear_telemetry();

  let buffer = LinkBuffer::new(4);
  buffer.put(vec![0u8]).unwrap();
  buffer.close().unwrap();
  assert!(buffer.close().is_err());
  assert!(buffer.put(vec![1u8]).is_err());

  assert_eq!(telemetry::counter_value("LinkBuffer::close", "Closed"), 1);
  assert_eq!(telemetry::counter_value("LinkBuffer::put", "Rejected"), 1);

  let close_event = telemetry::events()
    .into_iter()
    .find(|e| e.event_type == "Closed")
    .expect("close event recorded");
  assert_eq!(close_event.value, Some(1));

  telemetry::print_telemetry_report();
}
