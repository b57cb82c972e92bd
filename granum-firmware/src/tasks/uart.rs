//! UART receive and transmit tasks
//!
//! Receive: idle-line reads are forwarded as chunks, errors as a marker so
//! the owner can resynchronise. Transmit: one burst from the pump is written
//! by DMA, then completion is signalled back.

use defmt::*;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::{UartRx, UartTx};
use embassy_time::Timer;
use heapless::Vec;

use granum_hal_stm32c0::uart::UartBusError;

use crate::channels::{
    RxChannel, RxEvent, TxChannel, TxDone, CONSOLE_TX, CONSOLE_TX_DONE, DISPLAY_TX,
    DISPLAY_TX_DONE, RX_CHUNK,
};

/// Receive task, one instance per UART
#[embassy_executor::task(pool_size = 2)]
pub async fn uart_rx_task(mut rx: UartRx<'static, Async>, sink: &'static RxChannel) {
    info!("UART RX task started");

    let mut buf = [0u8; RX_CHUNK];

    loop {
        match rx.read_until_idle(&mut buf).await {
            Ok(0) => {}
            Ok(n) => {
                trace!("RX: {} bytes", n);
                // n never exceeds the buffer
                if let Ok(chunk) = Vec::from_slice(&buf[..n]) {
                    sink.send(RxEvent::Data(chunk)).await;
                }
            }
            Err(e) => {
                warn!("UART read error: {:?}", UartBusError::from(e));
                sink.send(RxEvent::Error).await;
                Timer::after_millis(1).await;
            }
        }
    }
}

/// Console transmit task (USART1)
#[embassy_executor::task]
pub async fn console_tx_task(tx: UartTx<'static, Async>) {
    info!("Console TX task started");
    forward_bursts(tx, &CONSOLE_TX, &CONSOLE_TX_DONE).await
}

/// Display transmit task (USART2)
#[embassy_executor::task]
pub async fn display_tx_task(tx: UartTx<'static, Async>) {
    info!("Display TX task started");
    forward_bursts(tx, &DISPLAY_TX, &DISPLAY_TX_DONE).await
}

async fn forward_bursts<const B: usize>(
    mut tx: UartTx<'static, Async>,
    source: &'static TxChannel<B>,
    done: &'static TxDone,
) -> ! {
    loop {
        let burst = source.receive().await;
        if let Err(e) = tx.write(&burst).await {
            // The burst is lost; the pump must still be released
            warn!("UART write error: {:?}", UartBusError::from(e));
        }
        done.signal(());
    }
}
