// Purpose - external interfaces: the output device and the recorder tap.

pub mod device;

pub use device::OutputDevice;
