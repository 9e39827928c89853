use shared_models::schedule::{TimeOfDay, TimeSlot};

/// Splits `[start, end)` into contiguous slots of `duration_minutes`.
///
/// A trailing slot that would overrun `end` is dropped, so a window shorter
/// than one slot yields nothing. A zero duration also yields nothing.
pub fn generate_slots(start: TimeOfDay, end: TimeOfDay, duration_minutes: u16) -> Vec<TimeSlot> {
    if duration_minutes == 0 {
        return Vec::new();
    }

    let step = u32::from(duration_minutes);
    let end_minutes = u32::from(end.minutes());
    let mut current = u32::from(start.minutes());
    let mut slots = Vec::new();

    while current + step <= end_minutes {
        let slot = (
            TimeOfDay::from_minutes(current as u16),
            TimeOfDay::from_minutes((current + step) as u16),
        );
        let (Some(slot_start), Some(slot_end)) = slot else {
            break;
        };
        slots.push(TimeSlot { start: slot_start, end: slot_end });
        current += step;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn full_day_in_half_hours() {
        let slots = generate_slots(t("09:00"), t("17:00"), 30);
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0], TimeSlot { start: t("09:00"), end: t("09:30") });
        assert_eq!(slots[15], TimeSlot { start: t("16:30"), end: t("17:00") });
    }

    #[test]
    fn overrunning_slot_is_dropped() {
        let slots = generate_slots(t("09:00"), t("10:10"), 30);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.last().unwrap().end, t("10:00"));
    }

    #[test]
    fn window_shorter_than_duration_is_empty() {
        assert!(generate_slots(t("09:00"), t("09:20"), 30).is_empty());
        assert!(generate_slots(t("12:00"), t("09:00"), 30).is_empty());
        assert!(generate_slots(t("09:00"), t("17:00"), 0).is_empty());
    }

    #[test]
    fn slot_count_is_floor_of_window_over_duration() {
        let windows = [("08:00", "12:45"), ("09:15", "17:00"), ("00:00", "23:59"), ("13:00", "13:10")];
        for (start, end) in windows {
            for duration in [10u16, 15, 20, 25, 30, 45, 60, 120] {
                let (start, end) = (t(start), t(end));
                let slots = generate_slots(start, end, duration);
                let window = (end.minutes() - start.minutes()) as usize;
                assert_eq!(slots.len(), window / duration as usize);

                let mut expected_start = start;
                for slot in &slots {
                    assert_eq!(slot.start, expected_start);
                    assert_eq!(slot.end.minutes() - slot.start.minutes(), duration);
                    assert!(slot.end <= end);
                    expected_start = slot.end;
                }
            }
        }
    }
}
