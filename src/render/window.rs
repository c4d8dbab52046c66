//! X11 preview window. Shows a rendered frame, scrolls with the wheel and
//! logs the href of clicked links.

use thiserror::Error;
use tracing::{debug, info};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    AtomEnum, ConnectionExt, CreateGCAux, CreateWindowAux, EventMask, ImageFormat, PropMode,
    WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperConnectionExt;

use crate::render::{Frame, HitTestIndex};

const SCROLL_STEP: i32 = 48;
const SCREEN_MARGIN: u16 = 96;
/// Room left in each PutImage request for the request header.
const PUT_IMAGE_HEADER: usize = 64;

const BUTTON_LEFT: u8 = 1;
const WHEEL_UP: u8 = 4;
const WHEEL_DOWN: u8 = 5;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("could not connect to the X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("X11 connection failed: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("X11 request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),
    #[error("unsupported X11 visual: depth {depth} at {bits_per_pixel} bits per pixel")]
    UnsupportedVisual { depth: u8, bits_per_pixel: u8 },
    #[error("frame is {0} pixels wide; X11 windows are limited to 65535")]
    TooWide(u32),
}

struct PreviewWindow {
    conn: RustConnection,
    window: u32,
    gc: u32,
    depth: u8,
    height: u16,
    wm_delete: u32,
}

impl PreviewWindow {
    fn open(frame: &Frame, title: &str) -> Result<Self, WindowError> {
        let width = u16::try_from(frame.width).map_err(|_| WindowError::TooWide(frame.width))?;
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let (root, depth, background) = (screen.root, screen.root_depth, screen.white_pixel);
        let max_height = screen.height_in_pixels.saturating_sub(SCREEN_MARGIN).max(1);
        let height = u16::try_from(frame.height).unwrap_or(u16::MAX).clamp(1, max_height);

        let bits_per_pixel = conn
            .setup()
            .pixmap_formats
            .iter()
            .find(|format| format.depth == depth)
            .map_or(32, |format| format.bits_per_pixel);
        if bits_per_pixel != 32 || depth < 24 {
            return Err(WindowError::UnsupportedVisual {
                depth,
                bits_per_pixel,
            });
        }

        let window = conn.generate_id()?;
        let gc = conn.generate_id()?;
        let aux = CreateWindowAux::new().background_pixel(background).event_mask(
            EventMask::EXPOSURE
                | EventMask::BUTTON_PRESS
                | EventMask::BUTTON_RELEASE
                | EventMask::KEY_PRESS
                | EventMask::STRUCTURE_NOTIFY,
        );
        conn.create_window(
            depth,
            window,
            root,
            0,
            0,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &aux,
        )?;
        conn.create_gc(gc, window, &CreateGCAux::new())?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;

        let wm_protocols = conn.intern_atom(false, b"WM_PROTOCOLS")?.reply()?.atom;
        let wm_delete = conn.intern_atom(false, b"WM_DELETE_WINDOW")?.reply()?.atom;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            wm_protocols,
            AtomEnum::ATOM,
            &[wm_delete],
        )?;

        conn.map_window(window)?;
        conn.flush()?;

        Ok(Self {
            conn,
            window,
            gc,
            depth,
            height,
            wm_delete,
        })
    }

    /// Puts the frame rows starting at `offset`, split to fit the request size limit.
    fn present(&self, frame: &Frame, offset: usize) -> Result<(), WindowError> {
        let stride = frame.width as usize * 4;
        let visible = (self.height as usize).min(frame.height as usize - offset);
        let max_rows = (self.conn.maximum_request_bytes().saturating_sub(PUT_IMAGE_HEADER) / stride).max(1);

        let mut row = 0;
        while row < visible {
            let rows = max_rows.min(visible - row);
            let start = (offset + row) * stride;
            self.conn.put_image(
                ImageFormat::Z_PIXMAP,
                self.window,
                self.gc,
                frame.width as u16,
                rows as u16,
                0,
                row as i16,
                0,
                self.depth,
                &frame.pixels[start..start + rows * stride],
            )?;
            row += rows;
        }
        self.conn.flush()?;
        Ok(())
    }
}

/// Blocks until the window is closed or a key is pressed.
pub fn show(frame: &Frame, links: &HitTestIndex, title: &str) -> Result<(), WindowError> {
    let window = PreviewWindow::open(frame, title)?;
    let max_offset = frame.height.saturating_sub(u32::from(window.height)) as usize;
    let mut offset = 0usize;
    info!(
        width = frame.width,
        height = frame.height,
        links = links.links().len(),
        "preview window open; press any key to close"
    );
    for link in links.links() {
        debug!(href = %link.href, x = link.x, y = link.y, w = link.w, h = link.h, "link region");
    }

    loop {
        match window.conn.wait_for_event()? {
            Event::Expose(ev) if ev.count == 0 => window.present(frame, offset)?,
            Event::ButtonPress(ev) if ev.detail == WHEEL_UP || ev.detail == WHEEL_DOWN => {
                let next = if ev.detail == WHEEL_UP {
                    offset.saturating_sub(SCROLL_STEP as usize)
                } else {
                    (offset + SCROLL_STEP as usize).min(max_offset)
                };
                if next != offset {
                    offset = next;
                    window.present(frame, offset)?;
                }
            }
            Event::ButtonRelease(ev) if ev.detail == BUTTON_LEFT => {
                let x = i32::from(ev.event_x);
                let y = i32::from(ev.event_y) + offset as i32;
                match links.hit(x, y) {
                    Some(link) => info!(href = %link.href, "link clicked"),
                    None => debug!(x, y, "click outside any link"),
                }
            }
            Event::ClientMessage(ev) if ev.data.as_data32()[0] == window.wm_delete => break,
            Event::KeyPress(_) | Event::DestroyNotify(_) => break,
            _ => {}
        }
    }
    Ok(())
}
