// Generated by abnfgen. Do not edit.

/// Key/value pairs.
pub struct Pair;

/// Callbacks fired around each public rule of [`Pair`].
pub trait PairListener {
    fn enter_pair(&mut self, _input: &[u8], _start_index: usize) {}
    fn exit_pair(&mut self, _input: &[u8], _start_index: usize, _end_index: Option<usize>) {}

    fn enter_key(&mut self, _input: &[u8], _start_index: usize) {}
    fn exit_key(&mut self, _input: &[u8], _start_index: usize, _end_index: Option<usize>) {}

    fn enter_value(&mut self, _input: &[u8], _start_index: usize) {}
    fn exit_value(&mut self, _input: &[u8], _start_index: usize, _end_index: Option<usize>) {}

    fn enter_sign(&mut self, _input: &[u8], _start_index: usize) {}
    fn exit_sign(&mut self, _input: &[u8], _start_index: usize, _end_index: Option<usize>) {}

    fn enter_padding(&mut self, _input: &[u8], _start_index: usize) {}
    fn exit_padding(&mut self, _input: &[u8], _start_index: usize, _end_index: Option<usize>) {}
}

impl PairListener for () {}

#[allow(dead_code, unused_mut, unused_variables, unused_assignments, unused_labels, clippy::all)]
impl Pair {
    /// `pair = key %x3D value`
    pub fn parse_pair(input: &[u8], start_index: usize, listener: &mut dyn PairListener) -> Option<usize> {
        listener.enter_pair(input, start_index);
        let index = start_index;
        let end_index = 'c1: {
            let mut index = index;
            let next = Self::parse_key(input, index, listener);
            match next {
                Some(next) => index = next,
                None => break 'c1 None,
            }
            let next = match input.get(index) {
                Some(&c) if c == b'=' => Some(index + 1),
                _ => None,
            };
            match next {
                Some(next) => index = next,
                None => break 'c1 None,
            }
            let next = Self::parse_value(input, index, listener);
            match next {
                Some(next) => index = next,
                None => break 'c1 None,
            }
            Some(index)
        };
        listener.exit_pair(input, start_index, end_index);
        end_index
    }

    /// `key = 1*3ALPHA`
    pub fn parse_key(input: &[u8], start_index: usize, listener: &mut dyn PairListener) -> Option<usize> {
        listener.enter_key(input, start_index);
        let index = start_index;
        let end_index = 'r2: {
            let mut index = index;
            let mut count: usize = 0;
            'l3: while count < 3 {
                let next = Self::parse_alpha(input, index);
                match next {
                    Some(next) if next == index => {
                        count = count.max(1);
                        break 'l3;
                    }
                    Some(next) => {
                        count += 1;
                        index = next;
                    }
                    None => break 'l3,
                }
            }
            if count < 1 {
                break 'r2 None;
            }
            Some(index)
        };
        listener.exit_key(input, start_index, end_index);
        end_index
    }

    /// `value = sign / DIGIT / 2DIGIT`
    pub fn parse_value(input: &[u8], start_index: usize, listener: &mut dyn PairListener) -> Option<usize> {
        listener.enter_value(input, start_index);
        let index = start_index;
        let end_index = 'a6: {
            let next = Self::parse_sign(input, index, listener);
            if next.is_some() {
                break 'a6 next;
            }
            let next = Self::parse_digit(input, index);
            if next.is_some() {
                break 'a6 next;
            }
            'r4: {
                let mut index = index;
                let mut count: usize = 0;
                'l5: while count < 2 {
                    let next = Self::parse_digit(input, index);
                    match next {
                        Some(next) if next == index => {
                            count = count.max(2);
                            break 'l5;
                        }
                        Some(next) => {
                            count += 1;
                            index = next;
                        }
                        None => break 'l5,
                    }
                }
                if count < 2 {
                    break 'r4 None;
                }
                Some(index)
            }
        };
        listener.exit_value(input, start_index, end_index);
        end_index
    }

    /// `sign = %x2B / %x2D`
    pub fn parse_sign(input: &[u8], start_index: usize, listener: &mut dyn PairListener) -> Option<usize> {
        listener.enter_sign(input, start_index);
        let index = start_index;
        let end_index = match input.get(index) {
            Some(&c) if c == b'+' || c == b'-' => Some(index + 1),
            _ => None,
        };
        listener.exit_sign(input, start_index, end_index);
        end_index
    }

    /// `padding = 2*(*SP)`
    pub fn parse_padding(input: &[u8], start_index: usize, listener: &mut dyn PairListener) -> Option<usize> {
        listener.enter_padding(input, start_index);
        let index = start_index;
        let end_index = 'r9: {
            let mut index = index;
            let mut count: usize = 0;
            'l10: loop {
                let next = 'r7: {
                    let mut index = index;
                    'l8: loop {
                        let next = Self::parse_sp(input, index);
                        match next {
                            Some(next) if next == index => {
                                break 'l8;
                            }
                            Some(next) => {
                                index = next;
                            }
                            None => break 'l8,
                        }
                    }
                    Some(index)
                };
                match next {
                    Some(next) if next == index => {
                        count = count.max(2);
                        break 'l10;
                    }
                    Some(next) => {
                        count += 1;
                        index = next;
                    }
                    None => break 'l10,
                }
            }
            if count < 2 {
                break 'r9 None;
            }
            Some(index)
        };
        listener.exit_padding(input, start_index, end_index);
        end_index
    }

    /// `ALPHA = %x41-5A / %x61-7A`
    fn parse_alpha(input: &[u8], index: usize) -> Option<usize> {
        match input.get(index) {
            Some(&c) if (c >= 64 && c < 128 && (1u64 << (c - 64)) & 0x07FFFFFE07FFFFFE != 0) => Some(index + 1),
            _ => None,
        }
    }

    /// `DIGIT = %x30-39`
    fn parse_digit(input: &[u8], index: usize) -> Option<usize> {
        match input.get(index) {
            Some(&c) if (c < 64 && (1u64 << c) & 0x03FF000000000000 != 0) => Some(index + 1),
            _ => None,
        }
    }

    /// `SP = %x20`
    fn parse_sp(input: &[u8], index: usize) -> Option<usize> {
        match input.get(index) {
            Some(&c) if c == b' ' => Some(index + 1),
            _ => None,
        }
    }
}
