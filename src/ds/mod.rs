mod ring_buffer;
mod value_table;

pub use ring_buffer::RingBuffer;
pub use value_table::{ActionValueTable, ActionValues, TableEntry};
